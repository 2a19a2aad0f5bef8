use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

mod config;
mod extract;
mod logging;
mod mcp;
mod scrape;

use scrape::{HttpPageSource, ScrapeResult, Scraper};

#[derive(Parser)]
#[command(name = "lilfetch")]
#[command(about = "Fetch web pages as clean Markdown, standalone or as an MCP server")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.lilfetch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server over stdin/stdout
    Serve,

    /// Scrape URLs and print the results
    Fetch {
        /// URLs to scrape, in order
        #[arg(required = true)]
        urls: Vec<String>,

        /// Label used in filename suggestions
        #[arg(long, short)]
        label: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the tool definitions exposed over MCP
    Tools,

    /// Write the default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Markdown of each page, failures on stderr
    Text,
    /// The same result list the MCP tool returns
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load()?,
    };
    logging::init(&config.logging)?;

    match cli.command {
        Commands::Serve => {
            mcp::transport::serve_stdio(&config).await?;
        }

        Commands::Fetch {
            urls,
            label,
            format,
        } => {
            run_fetch(&urls, label, format, &config).await?;
        }

        Commands::Tools => {
            let registry = mcp::tools::ToolRegistry::builtin()?;
            println!("{}", serde_json::to_string_pretty(registry.tools())?);
        }

        Commands::Init { force } => {
            init_config(cli.config, force)?;
        }
    }

    Ok(())
}

async fn run_fetch(
    urls: &[String],
    label: Option<String>,
    format: Format,
    config: &config::Config,
) -> Result<()> {
    let scraper = Scraper::new(HttpPageSource::new(config)?, config);
    let label = label.unwrap_or_else(|| scraper.default_label().to_string());

    let results = scraper.scrape_batch(urls, &label).await;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        Format::Text => {
            for result in &results {
                match result {
                    ScrapeResult::Success {
                        url,
                        content,
                        filename_suggestion,
                    } => {
                        println!("<!-- {} ({}) -->\n", filename_suggestion, url);
                        println!("{}\n", content);
                    }
                    ScrapeResult::Failure { url, error_message } => {
                        eprintln!("✗ {}: {}", url, error_message);
                    }
                }
            }
        }
    }

    let failed = results
        .iter()
        .filter(|r| matches!(r, ScrapeResult::Failure { .. }))
        .count();
    if failed > 0 {
        eprintln!("{} of {} URL(s) failed", failed, results.len());
    }

    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = match path {
        Some(path) => path,
        None => config::Config::config_path()?,
    };

    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let default_config = include_str!("../default_config.toml");
    std::fs::write(&config_path, default_config)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    println!("✓ Created {}", config_path.display());

    Ok(())
}
