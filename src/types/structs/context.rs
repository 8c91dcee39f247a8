use serde::Serialize;

/// Feature vector handed to the arms for a single decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    features: Vec<f64>,
}

impl Context {
    pub fn new(features: Vec<f64>) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn dimension(&self) -> usize {
        self.features.len()
    }

    // Mean of every feature but the leading bias term, clamped to [0, 1].
    pub fn summary(&self) -> f64 {
        let signals = self.features.get(1..).unwrap_or(&[]);

        if signals.is_empty() {
            return 0.0;
        }

        let mean = signals.iter().sum::<f64>() / signals.len() as f64;

        if mean.is_finite() {
            mean.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_finite(&self) -> bool {
        self.features.iter().all(|f| f.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_ignores_bias() {
        let context = Context::new(vec![1.0, 0.2, 0.4, 0.6]);

        assert!((context.summary() - 0.4).abs() < 1e-12);
        assert_eq!(context.dimension(), 4);
    }

    #[test]
    fn test_summary_of_degenerate_contexts() {
        assert_eq!(Context::new(vec![1.0]).summary(), 0.0);
        assert_eq!(Context::new(vec![1.0, f64::NAN]).summary(), 0.0);
        assert_eq!(Context::new(vec![1.0, 3.0]).summary(), 1.0);
    }
}
