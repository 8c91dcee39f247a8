pub mod epsilon_greedy;
pub mod lin_ucb;
pub mod logistic;

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    tasks::arms::{epsilon_greedy::EpsilonGreedyArm, lin_ucb::LinUcbArm, logistic::LogisticArm},
    types::{configs::bandit_config::ArmConfig, error::AppError, traits::arm::Arm},
};

/// Builds the arm described by `config` for contexts of `dimension` features.
/// `index` names the arm and offsets its random generator from `seed`.
pub fn build_arm(
    config: &ArmConfig,
    index: usize,
    dimension: usize,
    seed: Option<u64>,
) -> Result<Box<dyn Arm>, AppError> {
    config.validate()?;

    if dimension == 0 {
        return Err(AppError::configuration("arms need at least one context feature"));
    }

    let arm: Box<dyn Arm> = match config {
        ArmConfig::EpsilonGreedy(c) => Box::new(EpsilonGreedyArm::new(
            format!("epsilon_greedy#{}", index),
            dimension,
            c,
            arm_rng(seed, index),
        )),
        ArmConfig::LinUcb(c) => Box::new(LinUcbArm::new(format!("lin_ucb#{}", index), dimension, c)),
        ArmConfig::Logistic(c) => {
            Box::new(LogisticArm::new(format!("logistic#{}", index), dimension, c))
        }
    };

    Ok(arm)
}

pub fn arm_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64 + 1)),
        None => StdRng::from_entropy(),
    }
}
