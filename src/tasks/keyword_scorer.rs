use std::collections::{BTreeSet, HashMap};

use crate::types::{
    configs::keyword_scorer_config::KeywordScorerConfig, error::AppError,
    traits::relevance_scorer::RelevanceScorer,
};

/// Scores text by how many of the subject's terms it mentions, and how often.
///
/// The score is the fraction of distinct subject terms present in the text,
/// scaled by `1 - exp(-occurrences / saturation)` so that a single passing
/// mention counts for less than a page that keeps returning to the subject.
pub struct KeywordScorer {
    saturation: f64,
    min_term_length: usize,
}

impl KeywordScorer {
    pub fn new(config: &KeywordScorerConfig) -> Result<Self, AppError> {
        if !(config.saturation.is_finite() && config.saturation > 0.0) {
            return Err(AppError::configuration("scorer saturation must be positive"));
        }

        Ok(Self {
            saturation: config.saturation,
            min_term_length: config.min_term_length,
        })
    }

    fn terms(&self, subject: &str) -> BTreeSet<String> {
        tokens(subject)
            .filter(|t| t.chars().count() >= self.min_term_length)
            .collect()
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

impl RelevanceScorer for KeywordScorer {
    fn score(&self, text: &str, subject: &str) -> Result<f64, AppError> {
        let terms = self.terms(subject);

        if terms.is_empty() {
            return Err(AppError::configuration(format!(
                "subject {:?} has no usable terms",
                subject
            )));
        }

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for token in tokens(text) {
            if let Some(term) = terms.get(&token) {
                *counts.entry(term.as_str()).or_default() += 1;
            }
        }

        let coverage = counts.len() as f64 / terms.len() as f64;
        let occurrences = counts.values().sum::<u64>() as f64;

        Ok(coverage * (1.0 - (-occurrences / self.saturation).exp()))
    }
}
