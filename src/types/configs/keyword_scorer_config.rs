use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct KeywordScorerConfig {
    /// Number of subject term occurrences at which the score reaches ~63% of
    /// its ceiling.
    pub saturation: f64,
    /// Terms shorter than this are ignored.
    pub min_term_length: usize,
}

impl Default for KeywordScorerConfig {
    fn default() -> Self {
        KeywordScorerConfig {
            saturation: 1.0,
            min_term_length: 2,
        }
    }
}
