use rand::{rngs::StdRng, Rng};

use crate::types::{
    configs::bandit_config::EpsilonGreedyConfig,
    error::AppError,
    structs::{
        context::Context,
        decision::{Action, Estimate, Selection},
    },
    traits::arm::Arm,
};

// Running mean of one bucket. The prior counts as the first observation.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    mean: f64,
    weight: f64,
}

/// Baseline arm: buckets the context summary and keeps a running mean reward
/// per bucket, acting at random with probability epsilon.
pub struct EpsilonGreedyArm {
    name: String,
    dimension: usize,
    epsilon: f64,
    buckets: Vec<Bucket>,
    rng: StdRng,
}

impl EpsilonGreedyArm {
    pub fn new(
        name: impl Into<String>,
        dimension: usize,
        config: &EpsilonGreedyConfig,
        rng: StdRng,
    ) -> Self {
        let bucket = Bucket {
            mean: config.initial_estimate,
            weight: 1.0,
        };

        Self {
            name: name.into(),
            dimension,
            epsilon: config.epsilon,
            buckets: vec![bucket; config.bins.max(1)],
            rng,
        }
    }

    fn bucket_index(&self, context: &Context) -> usize {
        let bins = self.buckets.len();
        ((context.summary() * bins as f64) as usize).min(bins - 1)
    }

    pub fn observations(&self, context: &Context) -> u64 {
        (self.buckets[self.bucket_index(context)].weight - 1.0) as u64
    }
}

impl Arm for EpsilonGreedyArm {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn estimate(&self, context: &Context) -> Result<Estimate, AppError> {
        self.check_dimension(context)?;

        let bucket = self.buckets[self.bucket_index(context)];

        if !bucket.mean.is_finite() {
            return Ok(Estimate::neutral(1.0));
        }

        Ok(Estimate::new(bucket.mean, 0.0))
    }

    fn update(&mut self, context: &Context, reward: f64) -> Result<(), AppError> {
        self.check_dimension(context)?;

        if !reward.is_finite() {
            log::warn!("{}: ignoring non-finite reward", self.name);
            return Ok(());
        }

        let index = self.bucket_index(context);
        let bucket = &mut self.buckets[index];

        bucket.weight += 1.0;
        bucket.mean += (reward - bucket.mean) / bucket.weight;

        Ok(())
    }

    fn select(&mut self, context: &Context, threshold: f64) -> Result<Selection, AppError> {
        let estimate = self.estimate(context)?;

        if self.epsilon > 0.0 && self.rng.gen_bool(self.epsilon) {
            let action = if self.rng.gen_bool(0.5) {
                Action::Download
            } else {
                Action::Skip
            };

            return Ok(Selection {
                action,
                estimate,
                explored: true,
            });
        }

        let action = if estimate.score() > threshold {
            Action::Download
        } else {
            Action::Skip
        };

        Ok(Selection {
            action,
            estimate,
            explored: false,
        })
    }
}
