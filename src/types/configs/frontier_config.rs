use serde::Deserialize;

/// Order in which the frontier hands out candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontierPolicy {
    /// First discovered, first decided.
    Fifo,
    /// Highest priority hint first, ties in discovery order.
    Priority,
}

impl Default for FrontierPolicy {
    fn default() -> Self {
        FrontierPolicy::Fifo
    }
}
