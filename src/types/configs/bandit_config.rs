use serde::Deserialize;

use crate::types::error::AppError;

/// Configuration of the decision engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct BanditConfig {
    /// How the arms are consulted for a decision.
    pub protocol: Protocol,
    /// Which arms learn from a download reward.
    pub update_mode: UpdateMode,
    /// Arms, addressed by their position in this list.
    pub arms: Vec<ArmConfig>,
    /// Seed of the random generators, drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for BanditConfig {
    fn default() -> Self {
        BanditConfig {
            protocol: Protocol::default(),
            update_mode: UpdateMode::default(),
            arms: vec![ArmConfig::EpsilonGreedy(EpsilonGreedyConfig::default())],
            seed: None,
        }
    }
}

impl BanditConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.arms.is_empty() {
            return Err(AppError::configuration("at least one arm must be configured"));
        }

        if let Protocol::SingleEstimator { arm } = self.protocol {
            if arm >= self.arms.len() {
                return Err(AppError::configuration(format!(
                    "single estimator protocol uses arm {} but {} arms are configured",
                    arm,
                    self.arms.len()
                )));
            }
        }

        if let Protocol::Tournament {
            selection: TournamentSelection::ExploreFirst { horizon },
        } = self.protocol
        {
            if horizon == 0 {
                return Err(AppError::configuration("explore first horizon must be positive"));
            }
        }

        for arm in &self.arms {
            arm.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// One arm scores the context and its policy picks the action.
    SingleEstimator { arm: usize },
    /// Every arm scores the context, the winner's policy picks the action.
    Tournament {
        #[serde(default)]
        selection: TournamentSelection,
    },
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::SingleEstimator { arm: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum TournamentSelection {
    /// Take the arm with the highest expected reward plus bonus.
    Greedy,
    /// Draw arms uniformly until one leads all others by a Hoeffding margin,
    /// then always use that arm. `horizon` is the expected number of decisions.
    ExploreFirst { horizon: u64 },
}

impl Default for TournamentSelection {
    fn default() -> Self {
        TournamentSelection::Greedy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Only the arm responsible for the decision learns from its reward.
    Exclusive,
    /// Every arm learns from every download reward. Valid only when the reward
    /// does not depend on which arm recommended the download.
    CompareEstimators,
}

impl Default for UpdateMode {
    fn default() -> Self {
        UpdateMode::Exclusive
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ArmConfig {
    EpsilonGreedy(EpsilonGreedyConfig),
    LinUcb(LinUcbConfig),
    Logistic(LogisticConfig),
}

impl ArmConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            ArmConfig::EpsilonGreedy(c) => {
                check_unit("epsilon", c.epsilon)?;
                check_unit("initial_estimate", c.initial_estimate)?;
                if c.bins == 0 {
                    return Err(AppError::configuration("epsilon greedy needs at least one bin"));
                }
            }
            ArmConfig::LinUcb(c) => {
                check_non_negative("alpha", c.alpha)?;
                check_positive("lambda", c.lambda)?;
            }
            ArmConfig::Logistic(c) => {
                check_positive("learning_rate", c.learning_rate)?;
                check_non_negative("exploration", c.exploration)?;
                check_positive("regularization", c.regularization)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct EpsilonGreedyConfig {
    /// Probability of a uniformly random action.
    pub epsilon: f64,
    /// Number of buckets over the context summary in [0, 1].
    pub bins: usize,
    /// Prior mean reward of an unseen bucket, weighted as one observation.
    pub initial_estimate: f64,
}

impl Default for EpsilonGreedyConfig {
    fn default() -> Self {
        EpsilonGreedyConfig {
            epsilon: 0.1,
            bins: 10,
            initial_estimate: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct LinUcbConfig {
    /// Width of the confidence bound.
    pub alpha: f64,
    /// Ridge regularization, the design matrix starts at lambda * I.
    pub lambda: f64,
}

impl Default for LinUcbConfig {
    fn default() -> Self {
        LinUcbConfig {
            alpha: 1.0,
            lambda: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct LogisticConfig {
    /// SGD step size.
    pub learning_rate: f64,
    /// Width of the curvature based exploration bonus.
    pub exploration: f64,
    /// Prior curvature added to every feature.
    pub regularization: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        LogisticConfig {
            learning_rate: 0.1,
            exploration: 0.5,
            regularization: 1.0,
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), AppError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::configuration(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }

    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), AppError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(AppError::configuration(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }

    Ok(())
}

fn check_non_negative(name: &str, value: f64) -> Result<(), AppError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(AppError::configuration(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tournament() {
        let config: BanditConfig = serde_json::from_str(
            r#"{
                "protocol": {"type": "tournament", "selection": {"type": "explore_first", "horizon": 100}},
                "update_mode": "compare_estimators",
                "arms": [
                    {"type": "epsilon_greedy", "epsilon": 0.0},
                    {"type": "lin_ucb", "alpha": 0.5},
                    {"type": "logistic"}
                ],
                "seed": 7
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.protocol,
            Protocol::Tournament {
                selection: TournamentSelection::ExploreFirst { horizon: 100 }
            }
        );
        assert_eq!(config.update_mode, UpdateMode::CompareEstimators);
        assert_eq!(config.arms.len(), 3);
        assert!(matches!(&config.arms[1], ArmConfig::LinUcb(c) if c.alpha == 0.5 && c.lambda == 1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: BanditConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.protocol, Protocol::SingleEstimator { arm: 0 });
        assert_eq!(config.update_mode, UpdateMode::Exclusive);
        assert_eq!(config.arms.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let out_of_range = BanditConfig {
            protocol: Protocol::SingleEstimator { arm: 2 },
            ..BanditConfig::default()
        };

        assert!(out_of_range.validate().unwrap_err().is_fatal());

        let bad_epsilon = BanditConfig {
            arms: vec![ArmConfig::EpsilonGreedy(EpsilonGreedyConfig {
                epsilon: 1.5,
                ..EpsilonGreedyConfig::default()
            })],
            ..BanditConfig::default()
        };

        assert!(bad_epsilon.validate().is_err());

        let bad_lambda = BanditConfig {
            arms: vec![ArmConfig::LinUcb(LinUcbConfig {
                alpha: 1.0,
                lambda: 0.0,
            })],
            ..BanditConfig::default()
        };

        assert!(bad_lambda.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let parsed: Result<BanditConfig, _> =
            serde_json::from_str(r#"{"arms": [{"type": "lin_ucb", "beta": 1.0}]}"#);

        assert!(parsed.is_err());
    }
}
