use std::sync::Arc;

use crate::types::{configs::reward_config::RewardConfig, traits::reward_policy::RewardPolicy};

/// The reward is the relevance of the page.
pub struct RelevanceReward;

impl RewardPolicy for RelevanceReward {
    fn reward(&self, relevance: f64, _bytes: u64) -> f64 {
        clamp_unit(relevance)
    }
}

/// Relevance minus the page size as a fraction of `max_size`, so large pages
/// have to be proportionally more relevant to pay off.
pub struct SizePenalizedReward {
    max_size: u64,
}

impl SizePenalizedReward {
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size: max_size.max(1),
        }
    }
}

impl RewardPolicy for SizePenalizedReward {
    fn reward(&self, relevance: f64, bytes: u64) -> f64 {
        clamp_unit(relevance - bytes as f64 / self.max_size as f64)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn build_reward_policy(config: &RewardConfig) -> Arc<dyn RewardPolicy> {
    match config {
        RewardConfig::Relevance => Arc::new(RelevanceReward),
        RewardConfig::SizePenalized { max_size } => Arc::new(SizePenalizedReward::new(*max_size)),
    }
}
