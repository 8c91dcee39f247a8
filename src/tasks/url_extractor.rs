use std::{collections::HashSet, io::Cursor};

use async_trait::async_trait;

use crate::{
    types::{
        configs::url_extractor_config::UrlExtractorConfig,
        error::AppError,
        structs::page::{DiscoveredLink, FetchedPage},
        traits::link_extractor::LinkExtractor,
    },
    utils::fsm::url_fsm::LinkExtractorFSM,
};

/// Finds the outgoing links of a page and resolves them against the URL the
/// page was served from. Targets that are not http(s) are dropped.
pub struct UrlExtractor {
    config: UrlExtractorConfig,
}

impl UrlExtractor {
    pub fn new(config: &UrlExtractorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl LinkExtractor for UrlExtractor {
    async fn extract_links(&self, page: &FetchedPage) -> Result<Vec<DiscoveredLink>, AppError> {
        let buf = Box::new(Cursor::new(page.body.clone()));
        let fsm = LinkExtractorFSM::new(buf, self.config.include_bare_urls);
        let found = fsm.perform().await?;
        let total = found.len();
        let mut seen = HashSet::new();

        let links: Vec<DiscoveredLink> = found
            .into_iter()
            .filter_map(|link| match page.resolve(&link.href) {
                Ok(resolved) => Some(DiscoveredLink::new(resolved.to_string(), link.anchor_text)),
                Err(e) => {
                    log::debug!("dropping {} found on {}: {}", link.href, page.link, e);
                    None
                }
            })
            .filter(|link| {
                !self.config.same_host_only
                    || url::Url::parse(&link.href)
                        .map(|url| url.host_str() == Some(page.link.host()))
                        .unwrap_or(false)
            })
            // Different hrefs can resolve to the same link
            .filter(|link| seen.insert(link.href.clone()))
            .collect();

        log::debug!("{}: kept {} of {} links", page.link, links.len(), total);

        Ok(links)
    }
}
