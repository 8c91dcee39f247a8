use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::structs::link::Link;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Download,
    Skip,
}

/// What an arm believes about downloading a given context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub expected_reward: f64,
    pub exploration_bonus: f64,
    // Set when the arm hit a numerical fault and fell back to a neutral estimate
    pub degraded: bool,
}

impl Estimate {
    pub fn new(expected_reward: f64, exploration_bonus: f64) -> Self {
        Self {
            expected_reward,
            exploration_bonus,
            degraded: false,
        }
    }

    pub fn neutral(max_bonus: f64) -> Self {
        Self {
            expected_reward: 0.0,
            exploration_bonus: max_bonus,
            degraded: true,
        }
    }

    pub fn score(&self) -> f64 {
        self.expected_reward + self.exploration_bonus
    }
}

/// An arm's own download/skip verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Selection {
    pub action: Action,
    pub estimate: Estimate,
    // True when the action came from a random draw rather than the estimate
    pub explored: bool,
}

/// The bandit's verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub arm_id: usize,
    pub arm_name: String,
    pub estimate: Estimate,
    pub explored: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    // Seed page fetched before the bandit loop
    Bootstrap {
        bytes: u64,
        relevance: f64,
        links: usize,
        storage_key: Option<String>,
    },
    Skipped,
    Downloaded {
        bytes: u64,
        relevance: f64,
        links: usize,
        // Object store key of the saved body
        storage_key: Option<String>,
    },
    FetchFailed { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    BudgetExhausted,
    FrontierEmpty,
    Cancelled,
    DecisionLimit,
}

/// One line of the run output.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub link: Link,
    pub context: Vec<f64>,
    pub action: Action,
    pub reward: f64,
    pub cumulative_bytes: u64,
    pub arm_id: Option<usize>,
    pub arm_name: Option<String>,
    pub estimate: Option<Estimate>,
    pub explored: bool,
    pub outcome: Outcome,
}

#[derive(Debug, Default, Clone)]
pub struct DecisionLog {
    records: Vec<DecisionRecord>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DecisionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn downloads(&self) -> impl Iterator<Item = &DecisionRecord> {
        self.records
            .iter()
            .filter(|r| r.action == Action::Download)
    }

    // Bandit decisions only, the bootstrap record is not one.
    pub fn decisions(&self) -> usize {
        self.records.iter().filter(|r| r.arm_id.is_some()).count()
    }

    pub fn summarize(&self, reason: StopReason) -> RunSummary {
        let downloads: Vec<&DecisionRecord> = self.downloads().collect();
        let download_reward: f64 = downloads.iter().map(|r| r.reward).sum();

        RunSummary {
            reason,
            decisions: self.decisions(),
            downloads: downloads.len(),
            failed_downloads: downloads
                .iter()
                .filter(|r| matches!(r.outcome, Outcome::FetchFailed { .. }))
                .count(),
            bytes: self.records.last().map(|r| r.cumulative_bytes).unwrap_or(0),
            total_reward: self.records.iter().map(|r| r.reward).sum(),
            mean_download_reward: if downloads.is_empty() {
                0.0
            } else {
                download_reward / downloads.len() as f64
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub reason: StopReason,
    pub decisions: usize,
    pub downloads: usize,
    pub failed_downloads: usize,
    pub bytes: u64,
    pub total_reward: f64,
    pub mean_download_reward: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: usize, action: Action, reward: f64, bytes: u64, outcome: Outcome) -> DecisionRecord {
        DecisionRecord {
            step,
            timestamp: Utc::now(),
            link: Link::parse(&format!("http://example.com/{}", step)).unwrap(),
            context: vec![1.0, 0.5, 0.5, 0.5],
            action,
            reward,
            cumulative_bytes: bytes,
            arm_id: Some(0),
            arm_name: Some("epsilon_greedy".to_string()),
            estimate: Some(Estimate::new(0.5, 0.0)),
            explored: false,
            outcome,
        }
    }

    #[test]
    fn test_summary() {
        let mut log = DecisionLog::new();

        log.push(record(
            0,
            Action::Download,
            0.8,
            100,
            Outcome::Downloaded {
                bytes: 100,
                relevance: 0.8,
                links: 3,
                storage_key: Some("page-0".to_string()),
            },
        ));
        log.push(record(1, Action::Skip, 0.1, 100, Outcome::Skipped));
        log.push(record(
            2,
            Action::Download,
            0.0,
            100,
            Outcome::FetchFailed {
                error: "timeout".to_string(),
            },
        ));

        let summary = log.summarize(StopReason::FrontierEmpty);

        assert_eq!(summary.decisions, 3);
        assert_eq!(summary.downloads, 2);
        assert_eq!(summary.failed_downloads, 1);
        assert_eq!(summary.bytes, 100);
        assert!((summary.total_reward - 0.9).abs() < 1e-12);
        assert!((summary.mean_download_reward - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_estimate_is_flagged() {
        let estimate = Estimate::neutral(2.0);

        assert!(estimate.degraded);
        assert_eq!(estimate.score(), 2.0);
    }
}
