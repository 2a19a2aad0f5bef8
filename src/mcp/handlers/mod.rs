pub(crate) mod scrape;
