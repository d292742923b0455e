use serde::{Deserialize, Serialize};

/// Channel parameters for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Probability that a packet is dropped in transit.
    pub loss_rate: f64,
    /// Probability that a packet is corrupted in transit.
    pub corrupt_rate: f64,
    /// Lower bound of the one-way latency in ms.
    pub min_latency: u64,
    /// Upper bound of the one-way latency in ms.
    pub max_latency: u64,
    /// Seed for the channel RNG; identical seeds replay identical runs.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            min_latency: 10,
            max_latency: 100,
            seed: 0,
        }
    }
}
