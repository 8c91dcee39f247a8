use bytes::Bytes;
use url::Url;

use crate::types::{error::AppError, structs::link::Link};

/// A successfully downloaded document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub link: Link,
    // Where the body actually came from, after redirects. Relative hrefs
    // resolve against this, not the canonical link.
    pub final_url: Url,
    pub status: u16,
    pub body: Bytes,
    // Key of the persisted copy, when the fetcher stores bodies
    pub storage_key: Option<String>,
}

impl FetchedPage {
    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Canonical link of an href found on this page.
    pub fn resolve(&self, href: &str) -> Result<Link, AppError> {
        Link::resolve(&self.final_url, href)
    }
}

/// A raw link as found on a page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredLink {
    pub href: String,
    pub anchor_text: Option<String>,
}

impl DiscoveredLink {
    pub fn new(href: impl Into<String>, anchor_text: Option<String>) -> Self {
        Self {
            href: href.into(),
            anchor_text,
        }
    }
}
