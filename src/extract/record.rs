use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of processing one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Success,
    Error,
}

/// An anchor found on a page; `href` is kept exactly as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub text: String,
    pub href: String,
}

/// An image found on a page; missing attributes are empty strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    pub title: String,
}

/// Everything extracted from one fetch attempt
///
/// Error records carry only the URL and the error message; their other
/// fields are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub status: PageStatus,

    /// title, description, keywords, author and og_* fields, each present
    /// only when the page has the corresponding tag
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Cleaned body text
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub links: Vec<LinkRef>,

    #[serde(default)]
    pub images: Vec<ImageRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    /// Creates an error record for `url`
    pub fn error(url: &str, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status: PageStatus::Error,
            metadata: BTreeMap::new(),
            text: String::new(),
            links: Vec::new(),
            images: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PageStatus::Success
    }

    /// The page title, if the page had one
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").map(String::as_str)
    }
}
