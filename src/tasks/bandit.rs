use rand::{rngs::StdRng, Rng};

use crate::{
    tasks::arms::{arm_rng, build_arm},
    types::{
        configs::bandit_config::{BanditConfig, Protocol, TournamentSelection, UpdateMode},
        error::AppError,
        structs::{
            context::Context,
            decision::{Action, Decision, Estimate},
        },
        traits::arm::Arm,
    },
};

/// Rewards collected by decisions an arm was responsible for.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ArmStats {
    pub pulls: u64,
    pub downloads: u64,
    pub total_reward: f64,
}

impl ArmStats {
    pub fn mean_reward(&self) -> f64 {
        if self.pulls == 0 {
            0.0
        } else {
            self.total_reward / self.pulls as f64
        }
    }
}

/// Chooses between downloading and skipping by consulting its arms.
pub struct Bandit {
    arms: Vec<Box<dyn Arm>>,
    stats: Vec<ArmStats>,
    protocol: Protocol,
    update_mode: UpdateMode,
    threshold: f64,
    rng: StdRng,
    // Arm locked in by the explore-first tournament
    winner: Option<usize>,
}

impl Bandit {
    pub fn new(
        arms: Vec<Box<dyn Arm>>,
        protocol: Protocol,
        update_mode: UpdateMode,
        threshold: f64,
        rng: StdRng,
    ) -> Self {
        let stats = vec![ArmStats::default(); arms.len()];

        Self {
            arms,
            stats,
            protocol,
            update_mode,
            threshold,
            rng,
            winner: None,
        }
    }

    pub fn from_config(
        config: &BanditConfig,
        dimension: usize,
        threshold: f64,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let arms = config
            .arms
            .iter()
            .enumerate()
            .map(|(i, arm)| build_arm(arm, i, dimension, config.seed))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            arms,
            config.protocol,
            config.update_mode,
            threshold,
            arm_rng(config.seed, config.arms.len()),
        ))
    }

    pub fn arm_count(&self) -> usize {
        self.arms.len()
    }

    pub fn arm_name(&self, arm_id: usize) -> Option<&str> {
        self.arms.get(arm_id).map(|arm| arm.name())
    }

    pub fn stats(&self, arm_id: usize) -> Option<ArmStats> {
        self.stats.get(arm_id).copied()
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn estimate(&self, arm_id: usize, context: &Context) -> Result<Estimate, AppError> {
        self.arm(arm_id)?.estimate(context)
    }

    pub fn decide(&mut self, context: &Context) -> Result<Decision, AppError> {
        if self.arms.is_empty() {
            return Err(AppError::configuration("bandit has no arms to decide with"));
        }

        let arm_id = match self.protocol {
            Protocol::SingleEstimator { arm } => {
                self.arm(arm)?;
                arm
            }
            Protocol::Tournament { selection } => self.pick_arm(context, selection)?,
        };

        let selection = self.arms[arm_id].select(context, self.threshold)?;

        Ok(Decision {
            action: selection.action,
            arm_id,
            arm_name: self.arms[arm_id].name().to_string(),
            estimate: selection.estimate,
            explored: selection.explored,
        })
    }

    /// Credits `reward` to the arm that made the decision. Download rewards
    /// also train the estimators selected by the update mode. A skip reward is
    /// a known constant, so no estimator learns from it.
    pub fn update(
        &mut self,
        arm_id: usize,
        context: &Context,
        action: Action,
        reward: f64,
    ) -> Result<(), AppError> {
        self.arm(arm_id)?;

        let stats = &mut self.stats[arm_id];
        stats.pulls += 1;
        stats.total_reward += reward;

        if action == Action::Skip {
            return Ok(());
        }

        stats.downloads += 1;

        match self.update_mode {
            UpdateMode::Exclusive => self.arms[arm_id].update(context, reward),
            UpdateMode::CompareEstimators => {
                for arm in self.arms.iter_mut() {
                    arm.update(context, reward)?;
                }
                Ok(())
            }
        }
    }

    fn arm(&self, arm_id: usize) -> Result<&dyn Arm, AppError> {
        self.arms.get(arm_id).map(|arm| arm.as_ref()).ok_or_else(|| {
            AppError::configuration(format!(
                "arm {} does not exist, the bandit has {} arms",
                arm_id,
                self.arms.len()
            ))
        })
    }

    fn pick_arm(
        &mut self,
        context: &Context,
        selection: TournamentSelection,
    ) -> Result<usize, AppError> {
        match selection {
            TournamentSelection::Greedy => {
                let mut best = 0;
                let mut best_score = f64::NEG_INFINITY;

                for (i, arm) in self.arms.iter().enumerate() {
                    let score = arm.estimate(context)?.score();

                    if score > best_score {
                        best = i;
                        best_score = score;
                    }
                }

                Ok(best)
            }
            TournamentSelection::ExploreFirst { horizon } => {
                if self.winner.is_none() {
                    self.winner = self.leader(horizon);

                    if let Some(winner) = self.winner {
                        log::info!(
                            "{} wins the tournament after {} decisions",
                            self.arms[winner].name(),
                            self.stats.iter().map(|s| s.pulls).sum::<u64>()
                        );
                    }
                }

                Ok(match self.winner {
                    Some(winner) => winner,
                    None => self.rng.gen_range(0..self.arms.len()),
                })
            }
        }
    }

    // The arm whose mean reward beats every other arm's by four Hoeffding
    // widths, if there is one.
    fn leader(&self, horizon: u64) -> Option<usize> {
        if self.arms.len() == 1 {
            return Some(0);
        }

        let pulls: u64 = self.stats.iter().map(|s| s.pulls).sum();
        let hoeffding = (2.0 * horizon as f64 / (pulls as f64 + 1.0)).sqrt();

        let mut ranked: Vec<(usize, f64)> = self
            .stats
            .iter()
            .map(|s| s.mean_reward())
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (best, best_mean) = ranked[0];
        let runner_up = ranked[1].1;

        if best_mean - runner_up > 4.0 * hoeffding {
            Some(best)
        } else {
            None
        }
    }
}
