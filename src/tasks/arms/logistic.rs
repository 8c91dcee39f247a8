use ndarray::{Array1, ArrayView1, Zip};

use crate::types::{
    configs::bandit_config::LogisticConfig,
    error::AppError,
    structs::{context::Context, decision::Estimate},
    traits::arm::Arm,
};

/// Online logistic regression on soft labels.
///
/// The reward itself is the label, so `σ(w·x)` tracks the expected reward of a
/// context. A diagonal approximation of the Fisher information supplies the
/// exploration bonus.
pub struct LogisticArm {
    name: String,
    learning_rate: f64,
    exploration: f64,
    regularization: f64,
    weights: Array1<f64>,
    curvature: Array1<f64>,
    observations: u64,
    faults: u64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticArm {
    pub fn new(name: impl Into<String>, dimension: usize, config: &LogisticConfig) -> Self {
        Self {
            name: name.into(),
            learning_rate: config.learning_rate,
            exploration: config.exploration,
            regularization: config.regularization,
            weights: Array1::zeros(dimension),
            curvature: Array1::zeros(dimension),
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

    fn bonus(&self, x: ArrayView1<f64>, curvature: &Array1<f64>) -> f64 {
        let spread: f64 = Zip::from(&x)
            .and(curvature)
            .fold(0.0, |acc, &xi, &fi| acc + xi * xi / (self.regularization + fi));

        self.exploration * spread.sqrt()
    }
}

impl Arm for LogisticArm {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.weights.len()
    }

    fn estimate(&self, context: &Context) -> Result<Estimate, AppError> {
        self.check_dimension(context)?;

        let x = ArrayView1::from(context.features());
        let max_bonus = self.bonus(x, &Array1::zeros(self.weights.len()));

        if !context.is_finite() {
            return Ok(Estimate::neutral(self.exploration));
        }

        let p = sigmoid(self.weights.dot(&x));
        let bonus = self.bonus(x, &self.curvature);

        if !p.is_finite() || !bonus.is_finite() {
            log::warn!("{}: numerical fault, using neutral estimate", self.name);
            return Ok(Estimate::neutral(max_bonus));
        }

        Ok(Estimate::new(p, bonus))
    }

    fn update(&mut self, context: &Context, reward: f64) -> Result<(), AppError> {
        self.check_dimension(context)?;

        let x = ArrayView1::from(context.features());
        let p = sigmoid(self.weights.dot(&x));
        let step = self.learning_rate * (reward - p);

        if !step.is_finite() || !context.is_finite() {
            self.faults += 1;
            log::warn!("{}: dropping update (reward {}, p {})", self.name, reward, p);
            return Ok(());
        }

        self.weights.scaled_add(step, &x);

        let weight = p * (1.0 - p);
        Zip::from(&mut self.curvature)
            .and(&x)
            .for_each(|fi, &xi| *fi += weight * xi * xi);

        self.observations += 1;

        Ok(())
    }
}
