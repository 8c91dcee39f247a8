use serde::Deserialize;

/// Formula turning the relevance of a downloaded page into a reward.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum RewardConfig {
    /// Reward is the relevance score itself.
    Relevance,
    /// Relevance minus the page size as a fraction of `max_size`.
    SizePenalized { max_size: u64 },
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig::Relevance
    }
}
