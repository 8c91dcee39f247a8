use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct HttpFetcherConfig {
    pub proxy_server: Option<String>,
    // Seconds
    pub timeout: i32,
    pub user_agent: Option<String>,
    // Bodies larger than this are rejected as fetch failures
    pub max_body_bytes: Option<u64>,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        HttpFetcherConfig {
            proxy_server: None,
            timeout: 30,
            user_agent: None,
            max_body_bytes: Some(10 * 1024 * 1024),
        }
    }
}
