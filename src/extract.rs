//! HTML to Markdown-flavoured text
//!
//! Not a full HTML parser. Strips what a reader never sees, keeps headings,
//! links, list items and paragraph breaks, and decodes common entities.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").unwrap());

// The regex crate has no backreferences, so each invisible element gets its own pattern.
static INVISIBLE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?s)<!--.*?-->",
        r"(?is)<head[\s>].*?</head\s*>",
        r"(?is)<title[^>]*>.*?</title\s*>",
        r"(?is)<script[^>]*>.*?</script\s*>",
        r"(?is)<style[^>]*>.*?</style\s*>",
        r"(?is)<noscript[^>]*>.*?</noscript\s*>",
        r"(?is)<svg[^>]*>.*?</svg\s*>",
        r"(?is)<template[^>]*>.*?</template\s*>",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]\s*>").unwrap());

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#).unwrap()
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<li(\s[^>]*)?>").unwrap());

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(p|div|section|article|main|header|footer|nav|aside|ul|ol|table|tr|blockquote|pre|figure|hr)(\s[^>]*)?/?>",
    )
    .unwrap()
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").unwrap());

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Convert an HTML document into readable Markdown-like text
pub fn html_to_markdown(html: &str) -> String {
    let title = page_title(html);

    let mut text = html.to_string();
    for re in INVISIBLE.iter() {
        text = re.replace_all(&text, "").into_owned();
    }

    text = HEADING
        .replace_all(&text, |caps: &Captures| {
            let level: usize = caps[1].parse().unwrap_or(1);
            let inner = inline_text(&caps[2]);
            format!("\n\n{} {}\n\n", "#".repeat(level), inner)
        })
        .into_owned();

    text = LINK
        .replace_all(&text, |caps: &Captures| {
            let label = inline_text(&caps[2]);
            let href = caps[1].trim();
            if label.is_empty() {
                String::new()
            } else if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
                label
            } else {
                format!("[{}]({})", label, href)
            }
        })
        .into_owned();

    text = LIST_ITEM.replace_all(&text, "\n- ").into_owned();
    text = LINE_BREAK.replace_all(&text, "\n").into_owned();
    text = BLOCK.replace_all(&text, "\n\n").into_owned();
    text = TAG.replace_all(&text, "").into_owned();
    text = decode_entities(&text);

    let body = tidy_whitespace(&text);

    match title {
        Some(title) if !body.starts_with(&format!("# {}", title)) => {
            if body.is_empty() {
                format!("# {}", title)
            } else {
                format!("# {}\n\n{}", title, body)
            }
        }
        _ => body,
    }
}

/// Text of the document's <title>, if present and non-blank
pub fn page_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .map(|caps| inline_text(&caps[1]))
        .filter(|t| !t.is_empty())
}

/// Flatten an HTML fragment onto a single line
fn inline_text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    SPACES
        .replace_all(&decoded.replace(['\n', '\r'], " "), " ")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    let decoded = NUMERIC_ENTITY.replace_all(text, |caps: &Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // &amp; last so "&amp;lt;" stays "&lt;"
    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&hellip;", "\u{2026}")
        .replace("&copy;", "\u{a9}")
        .replace("&amp;", "&")
}

fn tidy_whitespace(text: &str) -> String {
    let lines: Vec<String> = text
        .replace("\r\n", "\n")
        .lines()
        .map(|line| SPACES.replace_all(line, " ").trim().to_string())
        .collect();

    let joined = lines.join("\n");
    BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
}
