use crate::types::{
    error::AppError,
    structs::{
        context::Context,
        decision::{Action, Estimate, Selection},
    },
};

/// An online estimator of the reward of downloading a candidate.
pub trait Arm: Send {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Expected reward and exploration bonus for `context`. Numerical faults
    /// are absorbed into a neutral estimate, only a dimension mismatch errors.
    fn estimate(&self, context: &Context) -> Result<Estimate, AppError>;

    /// Folds one observed download reward into the arm.
    fn update(&mut self, context: &Context, reward: f64) -> Result<(), AppError>;

    /// The arm's own download/skip policy.
    fn select(&mut self, context: &Context, threshold: f64) -> Result<Selection, AppError> {
        let estimate = self.estimate(context)?;
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

    fn check_dimension(&self, context: &Context) -> Result<(), AppError> {
        if context.dimension() != self.dimension() {
            return Err(AppError::configuration(format!(
                "{} arm expects {} context features, got {}",
                self.name(),
                self.dimension(),
                context.dimension()
            )));
        }

        Ok(())
    }
}
