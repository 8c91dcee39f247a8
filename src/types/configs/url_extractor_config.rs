use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct UrlExtractorConfig {
    /// Also collect http(s) URLs appearing in plain text, outside of <a> tags.
    pub include_bare_urls: bool,
    /// Only keep links on the same host as the page they were found on.
    pub same_host_only: bool,
}

impl Default for UrlExtractorConfig {
    fn default() -> Self {
        UrlExtractorConfig {
            include_bare_urls: false,
            same_host_only: true,
        }
    }
}
