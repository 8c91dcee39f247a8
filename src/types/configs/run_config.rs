use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{
    configs::{
        bandit_config::BanditConfig, frontier_config::FrontierPolicy,
        http_fetcher_config::HttpFetcherConfig, keyword_scorer_config::KeywordScorerConfig,
        reward_config::RewardConfig, url_extractor_config::UrlExtractorConfig,
    },
    error::AppError,
    structs::link::Link,
};

/// Everything a crawl run needs, loaded from a JSON document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub start_url: String,
    pub subject: String,
    /// Total bytes that may be downloaded.
    pub budget_bytes: u64,
    /// Upper bound on the number of bandit decisions.
    #[serde(default)]
    pub max_decisions: Option<usize>,
    /// Fixed reward of a skip.
    #[serde(default = "default_skip_reward")]
    pub skip_reward: f64,
    /// Score above which an arm downloads. Defaults to `skip_reward`.
    #[serde(default)]
    pub decision_threshold: Option<f64>,
    /// Fetch the seed page before asking the bandit anything.
    #[serde(default = "default_true")]
    pub download_seed: bool,
    #[serde(default)]
    pub frontier: FrontierPolicy,
    #[serde(default)]
    pub bandit: BanditConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub scorer: KeywordScorerConfig,
    #[serde(default)]
    pub extractor: UrlExtractorConfig,
    #[serde(default)]
    pub http: HttpFetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory receiving downloaded pages.
    pub repository: PathBuf,
    /// JSON lines file receiving one record per decision.
    pub decision_log: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            repository: PathBuf::from("repos"),
            decision_log: PathBuf::from("decisions.jsonl"),
        }
    }
}

fn default_skip_reward() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

impl RunConfig {
    pub fn new(start_url: &str, subject: &str, budget_bytes: u64) -> Self {
        RunConfig {
            start_url: start_url.to_string(),
            subject: subject.to_string(),
            budget_bytes,
            max_decisions: None,
            skip_reward: default_skip_reward(),
            decision_threshold: None,
            download_seed: true,
            frontier: FrontierPolicy::default(),
            bandit: BanditConfig::default(),
            reward: RewardConfig::default(),
            scorer: KeywordScorerConfig::default(),
            extractor: UrlExtractorConfig::default(),
            http: HttpFetcherConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let config: RunConfig = serde_json::from_str(json)
            .map_err(|e| AppError::configuration(format!("invalid run configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_json(&json)
    }

    pub fn threshold(&self) -> f64 {
        self.decision_threshold.unwrap_or(self.skip_reward)
    }

    pub fn start_link(&self) -> Result<Link, AppError> {
        Link::parse(&self.start_url).map_err(|e| {
            AppError::configuration(format!("invalid start url {}: {}", self.start_url, e))
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.start_link()?;

        if self.subject.trim().is_empty() {
            return Err(AppError::configuration("subject must not be empty"));
        }

        if !(0.0..=1.0).contains(&self.skip_reward) {
            return Err(AppError::configuration(format!(
                "skip_reward must be within [0, 1], got {}",
                self.skip_reward
            )));
        }

        if let Some(threshold) = self.decision_threshold {
            if !threshold.is_finite() {
                return Err(AppError::configuration("decision_threshold must be finite"));
            }
        }

        if let RewardConfig::SizePenalized { max_size } = self.reward {
            if max_size == 0 {
                return Err(AppError::configuration("size penalty max_size must be positive"));
            }
        }

        if !(self.scorer.saturation.is_finite() && self.scorer.saturation > 0.0) {
            return Err(AppError::configuration("scorer saturation must be positive"));
        }

        if self.http.timeout <= 0 {
            return Err(AppError::configuration("http timeout must be positive"));
        }

        self.bandit.validate()
    }
}

#[cfg(test)]
mod tests {
    use crate::types::configs::bandit_config::{ArmConfig, Protocol};

    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = RunConfig::from_json(
            r#"{
                "start_url": "https://en.wikipedia.org/wiki/Albert_Einstein",
                "subject": "Albert Einstein",
                "budget_bytes": 1048576
            }"#,
        )
        .unwrap();

        assert_eq!(config.budget_bytes, 1 << 20);
        assert_eq!(config.skip_reward, 0.1);
        assert_eq!(config.threshold(), 0.1);
        assert!(config.download_seed);
        assert_eq!(config.frontier, FrontierPolicy::Fifo);
        assert!(matches!(config.bandit.arms[0], ArmConfig::EpsilonGreedy(_)));
    }

    #[test]
    fn test_full_config() {
        let config = RunConfig::from_json(
            r#"{
                "start_url": "https://en.wikipedia.org/wiki/Albert_Einstein",
                "subject": "Albert Einstein",
                "budget_bytes": 5000000,
                "max_decisions": 200,
                "decision_threshold": 0.2,
                "frontier": "priority",
                "bandit": {
                    "protocol": {"type": "tournament"},
                    "arms": [{"type": "lin_ucb"}, {"type": "logistic", "learning_rate": 0.05}]
                },
                "reward": {"type": "size_penalized", "max_size": 1000000},
                "http": {"timeout": 10, "user_agent": "research-bot"},
                "output": {"repository": "/tmp/einstein", "decision_log": "/tmp/einstein.jsonl"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_decisions, Some(200));
        assert_eq!(config.threshold(), 0.2);
        assert_eq!(config.frontier, FrontierPolicy::Priority);
        assert!(matches!(config.bandit.protocol, Protocol::Tournament { .. }));
        assert!(matches!(
            config.reward,
            RewardConfig::SizePenalized { max_size: 1000000 }
        ));
        assert_eq!(config.http.user_agent.as_deref(), Some("research-bot"));
        assert_eq!(config.output.repository, PathBuf::from("/tmp/einstein"));
    }

    #[test]
    fn test_malformed_budget_is_a_configuration_error() {
        let err = RunConfig::from_json(
            r#"{
                "start_url": "https://en.wikipedia.org/wiki/Albert_Einstein",
                "subject": "Albert Einstein",
                "budget_bytes": -5
            }"#,
        )
        .unwrap_err();

        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = RunConfig::new("https://example.com", "physics", 100);

        assert!(config.validate().is_ok());

        config.start_url = "ftp://example.com/file".to_string();
        assert!(config.validate().is_err());

        config.start_url = "https://example.com".to_string();
        config.subject = "  ".to_string();
        assert!(config.validate().is_err());

        config.subject = "physics".to_string();
        config.skip_reward = 1.5;
        assert!(config.validate().is_err());
    }
}
