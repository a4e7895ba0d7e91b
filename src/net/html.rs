// Sat Oct 17 2026 - Alex

use scraper::{Html, Selector};

/// Minimal markup queries the race needs from a registration page.
pub trait HtmlParser: Send + Sync {
    /// `value` attribute of the first `<input name=...>`, if the input exists.
    fn input_value(&self, html: &str, name: &str) -> Option<String>;
}

pub struct ScraperHtmlParser;

impl ScraperHtmlParser {
    pub fn new() -> Self {
        Self
    }

    fn selector(tag: &str, name: &str) -> Option<Selector> {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        Selector::parse(&format!("{}[name=\"{}\"]", tag, escaped)).ok()
    }
}

impl Default for ScraperHtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlParser for ScraperHtmlParser {
    fn input_value(&self, html: &str, name: &str) -> Option<String> {
        let selector = Self::selector("input", name)?;
        let document = Html::parse_document(html);
        let value = document
            .select(&selector)
            .next()
            .map(|el| el.value().attr("value").unwrap_or("").to_string());
        value
    }
}
