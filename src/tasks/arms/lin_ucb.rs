use ndarray::{Array1, Array2, ArrayView1};

use crate::types::{
    configs::bandit_config::LinUcbConfig,
    error::AppError,
    structs::{context::Context, decision::Estimate},
    traits::arm::Arm,
};

/// Ridge regression with an upper confidence bound.
///
/// Keeps the inverse design matrix `A⁻¹` directly and refreshes it with a
/// Sherman-Morrison rank-one update per observation, so both `estimate` and
/// `update` are O(d²).
pub struct LinUcbArm {
    name: String,
    alpha: f64,
    lambda: f64,
    a_inv: Array2<f64>,
    b: Array1<f64>,
    observations: u64,
    // Updates dropped because they would have corrupted the state
    faults: u64,
}

impl LinUcbArm {
    pub fn new(name: impl Into<String>, dimension: usize, config: &LinUcbConfig) -> Self {
        Self {
            name: name.into(),
            alpha: config.alpha,
            lambda: config.lambda,
            a_inv: Array2::eye(dimension) / config.lambda,
            b: Array1::zeros(dimension),
            observations: 0,
            faults: 0,
        }
    }

    pub fn observations(&self) -> u64 {
        self.observations
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }

    // Bonus under the prior alone; A⁻¹ only shrinks from I/λ so this is the
    // largest bonus the arm can report for `x`.
    fn max_bonus(&self, x: ArrayView1<f64>) -> f64 {
        let norm = x.dot(&x).sqrt();
        let bonus = self.alpha * norm / self.lambda.sqrt();

        if bonus.is_finite() {
            bonus
        } else {
            self.alpha
        }
    }
}

impl Arm for LinUcbArm {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.b.len()
    }

    fn estimate(&self, context: &Context) -> Result<Estimate, AppError> {
        self.check_dimension(context)?;

        let x = ArrayView1::from(context.features());

        if !context.is_finite() {
            return Ok(Estimate::neutral(self.alpha));
        }

        let theta = self.a_inv.dot(&self.b);
        let expected = theta.dot(&x);
        let variance = x.dot(&self.a_inv.dot(&x));

        if !expected.is_finite() || !variance.is_finite() || variance < 0.0 {
            log::warn!(
                "{}: numerical fault (expected {}, variance {}), using neutral estimate",
                self.name,
                expected,
                variance
            );
            return Ok(Estimate::neutral(self.max_bonus(x)));
        }

        Ok(Estimate::new(expected, self.alpha * variance.sqrt()))
    }

    fn update(&mut self, context: &Context, reward: f64) -> Result<(), AppError> {
        self.check_dimension(context)?;

        let x = ArrayView1::from(context.features());
        let a_inv_x = self.a_inv.dot(&x);
        let denominator = 1.0 + x.dot(&a_inv_x);

        if !reward.is_finite()
            || !denominator.is_finite()
            || denominator <= f64::EPSILON
            || a_inv_x.iter().any(|v| !v.is_finite())
        {
            self.faults += 1;
            log::warn!(
                "{}: dropping update (reward {}, denominator {})",
                self.name,
                reward,
                denominator
            );
            return Ok(());
        }

        let column = a_inv_x.view().insert_axis(ndarray::Axis(1));
        let row = a_inv_x.view().insert_axis(ndarray::Axis(0));

        self.a_inv = &self.a_inv - &(column.dot(&row) / denominator);
        // Rounding slowly breaks the symmetry of A⁻¹
        self.a_inv = (&self.a_inv + &self.a_inv.t()) / 2.0;
        self.b.scaled_add(reward, &x);
        self.observations += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm() -> LinUcbArm {
        LinUcbArm::new(
            "lin_ucb",
            4,
            &LinUcbConfig {
                alpha: 1.0,
                lambda: 1.0,
            },
        )
    }

    #[test]
    fn test_prior_estimate() {
        let arm = arm();
        let context = Context::new(vec![1.0, 0.0, 0.0, 0.0]);
        let estimate = arm.estimate(&context).unwrap();

        assert_eq!(estimate.expected_reward, 0.0);
        assert!((estimate.exploration_bonus - 1.0).abs() < 1e-12);
        assert!(!estimate.degraded);
    }

    #[test]
    fn test_converges_monotonically() {
        let mut arm = arm();
        let context = Context::new(vec![1.0, 0.7, 0.4, 0.5]);
        let target = 0.8;
        let mut previous = arm.estimate(&context).unwrap();

        for _ in 0..300 {
            arm.update(&context, target).unwrap();
            let current = arm.estimate(&context).unwrap();

            assert!(
                (target - current.expected_reward).abs()
                    <= (target - previous.expected_reward).abs() + 1e-12
            );
            assert!(current.exploration_bonus <= previous.exploration_bonus + 1e-12);
            previous = current;
        }

        assert!((previous.expected_reward - target).abs() < 0.01);
        assert!(previous.exploration_bonus < 0.1);
        assert_eq!(arm.observations(), 300);
    }

    #[test]
    fn test_generalizes_over_features() {
        let mut arm = arm();
        let relevant = Context::new(vec![1.0, 0.9, 0.9, 0.5]);
        let unrelated = Context::new(vec![1.0, 0.05, 0.05, 0.5]);

        for _ in 0..50 {
            arm.update(&relevant, 0.9).unwrap();
            arm.update(&unrelated, 0.0).unwrap();
        }

        let probe = Context::new(vec![1.0, 0.8, 0.85, 0.33]);
        let junk = Context::new(vec![1.0, 0.1, 0.0, 0.33]);

        assert!(
            arm.estimate(&probe).unwrap().expected_reward
                > arm.estimate(&junk).unwrap().expected_reward
        );
    }

    #[test]
    fn test_numerical_fault_falls_back_to_neutral() {
        let mut arm = arm();
        let poisoned = Context::new(vec![1.0, f64::NAN, 0.0, 0.0]);

        arm.update(&poisoned, 1.0).unwrap();
        assert_eq!(arm.faults(), 1);
        assert_eq!(arm.observations(), 0);

        let estimate = arm.estimate(&poisoned).unwrap();
        assert!(estimate.degraded);
        assert_eq!(estimate.expected_reward, 0.0);

        // The arm is still usable afterwards
        let context = Context::new(vec![1.0, 0.5, 0.5, 0.5]);
        arm.update(&context, 0.5).unwrap();
        assert!(!arm.estimate(&context).unwrap().degraded);
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        let mut arm = arm();

        assert!(arm
            .update(&Context::new(vec![1.0, 0.5, 0.5]), 1.0)
            .unwrap_err()
            .is_fatal());
    }
}
