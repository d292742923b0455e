use crate::config::SimConfig;
use serde::Deserialize;

/// A declarative test scenario loaded from TOML: channel configuration,
/// a script of actions, and assertions checked after the run finishes.
#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: String,
    pub config: SimConfigOverride,
    pub actions: Vec<TestAction>,
    pub assertions: Vec<TestAssertion>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SimConfigOverride {
    pub loss_rate: Option<f64>,
    pub corrupt_rate: Option<f64>,
    pub min_latency: Option<u64>,
    pub max_latency: Option<u64>,
    pub seed: Option<u64>,
}

impl SimConfigOverride {
    pub fn apply_to(&self, config: &mut SimConfig) {
        if let Some(v) = self.loss_rate {
            config.loss_rate = v;
        }
        if let Some(v) = self.corrupt_rate {
            config.corrupt_rate = v;
        }
        if let Some(v) = self.min_latency {
            config.min_latency = v;
        }
        if let Some(v) = self.max_latency {
            config.max_latency = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAction {
    /// Application submits data at a specific time
    AppSend { time: u64, data: String },
    /// Deterministically drop the first data packet with given seq number
    DropNextFromSenderSeq { seq: u32 },
    /// Deterministically drop the first ACK with given ack number
    DropNextFromReceiverAck { ack: u32 },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAssertion {
    /// Assert that specific data was delivered to the application layer.
    /// Multiple occurrences are checked in order of appearance.
    DataDelivered { data: String },
    /// Assert that the total number of packets sent by the sender endpoint
    /// is within range
    SenderPacketCount { min: u32, max: Option<u32> },
    /// Assert that the simulation finishes within time
    MaxDuration { ms: u64 },
}
