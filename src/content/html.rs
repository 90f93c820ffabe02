//! HTML text extraction using the `scraper` crate.
//!
//! Pulls `<title>`, the meta description, and heading/paragraph text into a
//! flat text block suitable for an extraction prompt.

use scraper::{Html, Selector};

/// Plain-text view of an HTML page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub title: String,
    pub description: Option<String>,
    pub text: String,
}

/// Extract title, description, and readable text from an HTML document.
#[must_use]
pub fn extract_page_text(html: &str) -> PageText {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled page".to_string());

    let description = Selector::parse("meta[name=\"description\"]").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    });

    // Content-bearing elements in document order.
    let content_selector = Selector::parse("h1, h2, h3, h4, h5, h6, p, li, blockquote")
        .expect("static selector must parse");

    let mut blocks = Vec::new();
    for el in document.select(&content_selector) {
        let text = el.text().collect::<String>();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            blocks.push(text);
        }
    }

    PageText {
        title,
        description,
        text: blocks.join("\n"),
    }
}
