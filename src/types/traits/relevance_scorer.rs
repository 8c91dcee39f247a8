use crate::types::error::AppError;

/// Similarity of a piece of text to the crawl subject, in [0, 1].
pub trait RelevanceScorer: Send + Sync {
    fn score(&self, text: &str, subject: &str) -> Result<f64, AppError>;
}
