//! HTML content extraction
//!
//! Non-content elements are detached from the parsed tree first, so text,
//! links, and images are all read from the cleaned document.

use super::record::{ImageRef, LinkRef, PageRecord, PageStatus};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Elements removed before anything else is extracted
pub const STRIPPED_ELEMENTS: [&str; 4] = ["script", "style", "nav", "footer"];

/// `<meta name=...>` tags copied into metadata under the same key
const NAMED_META: [&str; 3] = ["description", "keywords", "author"];

/// Open Graph properties and their metadata keys
const OPEN_GRAPH: [(&str, &str); 5] = [
    ("og:title", "og_title"),
    ("og:description", "og_description"),
    ("og:image", "og_image"),
    ("og:url", "og_url"),
    ("og:type", "og_type"),
];

/// Builds a success record from a page body
///
/// Text is whitespace-collapsed and truncated to `max_text_length` characters.
pub fn extract_page(url: &str, html: &str, max_text_length: usize) -> PageRecord {
    let mut document = Html::parse_document(html);
    strip_elements(&mut document);

    PageRecord {
        url: url.to_string(),
        status: PageStatus::Success,
        metadata: extract_metadata(&document),
        text: extract_text(&document, max_text_length),
        links: extract_link_refs(&document),
        images: extract_images(&document),
        error: None,
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn strip_elements(document: &mut Html) {
    let Some(stripped) = selector(&STRIPPED_ELEMENTS.join(", ")) else {
        return;
    };

    let ids: Vec<_> = document.select(&stripped).map(|element| element.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Joins whitespace-separated words with single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn extract_text(document: &Html, max_text_length: usize) -> String {
    let text = element_text(document.root_element());

    if text.chars().count() <= max_text_length {
        return text;
    }
    let truncated: String = text.chars().take(max_text_length).collect();
    truncated.trim_end().to_string()
}

fn first_meta_content(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .map(|meta| meta.value().attr("content").unwrap_or("").to_string())
}

fn extract_metadata(document: &Html) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    if let Some(title) = selector("title").and_then(|sel| document.select(&sel).next()) {
        metadata.insert("title".to_string(), element_text(title));
    }

    for name in NAMED_META {
        if let Some(content) = first_meta_content(document, &format!("meta[name=\"{}\"]", name)) {
            metadata.insert(name.to_string(), content);
        }
    }

    for (property, key) in OPEN_GRAPH {
        if let Some(content) =
            first_meta_content(document, &format!("meta[property=\"{}\"]", property))
        {
            metadata.insert(key.to_string(), content);
        }
    }

    metadata
}

fn extract_link_refs(document: &Html) -> Vec<LinkRef> {
    let Some(anchor) = selector("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor)
        .map(|a| LinkRef {
            text: element_text(a),
            href: a.value().attr("href").unwrap_or("").to_string(),
        })
        .collect()
}

fn extract_images(document: &Html) -> Vec<ImageRef> {
    let Some(img) = selector("img") else {
        return Vec::new();
    };

    document
        .select(&img)
        .map(|image| {
            let attr = |name: &str| image.value().attr(name).unwrap_or("").to_string();
            ImageRef {
                src: attr("src"),
                alt: attr("alt"),
                title: attr("title"),
            }
        })
        .collect()
}
