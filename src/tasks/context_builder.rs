use std::sync::Arc;

use crate::types::{
    error::AppError,
    structs::{candidate::Candidate, context::Context},
    traits::relevance_scorer::RelevanceScorer,
};

/// Turns a frontier candidate into the feature vector the arms decide on:
/// `[bias, anchor relevance, title relevance, depth decay]`.
pub struct ContextBuilder {
    scorer: Arc<dyn RelevanceScorer>,
}

impl ContextBuilder {
    pub const DIMENSION: usize = 4;

    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer }
    }

    pub fn build(&self, candidate: &Candidate, subject: &str) -> Result<Context, AppError> {
        let anchor = match &candidate.anchor_text {
            Some(text) => self.relevance(text, subject)?,
            None => 0.0,
        };
        let title = self.relevance(&candidate.link.title(), subject)?;
        let depth = 1.0 / (1.0 + candidate.depth as f64);

        Ok(Context::new(vec![1.0, anchor, title, depth]))
    }

    fn relevance(&self, text: &str, subject: &str) -> Result<f64, AppError> {
        if text.trim().is_empty() {
            return Ok(0.0);
        }

        let score = self.scorer.score(text, subject).map_err(|e| match e {
            AppError::Configuration(_) => e,
            other => AppError::configuration(format!("relevance scorer failed: {}", other)),
        })?;

        if !score.is_finite() {
            return Err(AppError::configuration(format!(
                "relevance scorer returned {} for {:?}",
                score, text
            )));
        }

        Ok(score.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::structs::link::Link;

    struct ContainsScorer;

    impl RelevanceScorer for ContainsScorer {
        fn score(&self, text: &str, subject: &str) -> Result<f64, AppError> {
            if text.to_lowercase().contains(&subject.to_lowercase()) {
                Ok(1.5)
            } else {
                Ok(0.25)
            }
        }
    }

    struct BrokenScorer(f64);

    impl RelevanceScorer for BrokenScorer {
        fn score(&self, _text: &str, _subject: &str) -> Result<f64, AppError> {
            if self.0.is_nan() {
                Err("embedding table missing".into())
            } else {
                Ok(self.0)
            }
        }
    }

    fn candidate(anchor: Option<&str>, depth: u32) -> Candidate {
        Candidate::discovered(
            Link::parse("https://en.wikipedia.org/wiki/Albert_Einstein").unwrap(),
            anchor.map(str::to_string),
            depth,
            0.0,
        )
    }

    #[test]
    fn test_features() {
        let builder = ContextBuilder::new(Arc::new(ContainsScorer));
        let context = builder
            .build(&candidate(Some("the physicist"), 3), "einstein")
            .unwrap();

        assert_eq!(context.features(), &[1.0, 0.25, 1.0, 0.25]);
        assert_eq!(context.dimension(), ContextBuilder::DIMENSION);
    }

    #[test]
    fn test_missing_anchor_is_zero() {
        let builder = ContextBuilder::new(Arc::new(ContainsScorer));
        let context = builder.build(&candidate(None, 0), "einstein").unwrap();

        assert_eq!(context.features(), &[1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_deterministic() {
        let builder = ContextBuilder::new(Arc::new(ContainsScorer));
        let candidate = candidate(Some("relativity"), 2);

        assert_eq!(
            builder.build(&candidate, "einstein").unwrap(),
            builder.build(&candidate, "einstein").unwrap()
        );
    }

    #[test]
    fn test_scorer_faults_are_configuration_errors() {
        let failing = ContextBuilder::new(Arc::new(BrokenScorer(f64::NAN)));
        let infinite = ContextBuilder::new(Arc::new(BrokenScorer(f64::INFINITY)));

        assert!(failing
            .build(&candidate(Some("x"), 0), "einstein")
            .unwrap_err()
            .is_fatal());
        assert!(infinite
            .build(&candidate(None, 0), "einstein")
            .unwrap_err()
            .is_fatal());
    }
}
