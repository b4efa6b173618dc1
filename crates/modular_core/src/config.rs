//! Solver configuration.

use serde::{Deserialize, Serialize};

/// What to do when every candidate of the chosen cell weighs zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroWeightPolicy {
    /// Take the first candidate in ID order and count it in the stats
    #[default]
    FirstCandidate,
    /// Treat the cell as a contradiction and abandon the attempt
    Contradiction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Retries after the first attempt; a solve makes at most `max_retries + 1` attempts
    pub max_retries: u32,
    /// Collapse steps per `run` slice
    pub yield_every: usize,
    /// Fixed seed for reproducible solves; entropy-seeded when `None`
    pub seed: Option<u64>,
    pub zero_weight_policy: ZeroWeightPolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            yield_every: 50,
            seed: None,
            zero_weight_policy: ZeroWeightPolicy::FirstCandidate,
        }
    }
}

impl SolverConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_zero_weight_policy(mut self, policy: ZeroWeightPolicy) -> Self {
        self.zero_weight_policy = policy;
        self
    }

    /// Total attempts allowed per solve.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.max_attempts(), 6);
        assert_eq!(config.yield_every, 50);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SolverConfig =
            serde_json::from_str(r#"{ "seed": 9, "zero_weight_policy": "contradiction" }"#)
                .unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.zero_weight_policy, ZeroWeightPolicy::Contradiction);
    }
}
