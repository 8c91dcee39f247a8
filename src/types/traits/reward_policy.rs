/// Turns the relevance of a downloaded page into a reward in [0, 1].
pub trait RewardPolicy: Send + Sync {
    fn reward(&self, relevance: f64, bytes: u64) -> f64;
}
