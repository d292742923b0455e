//! Event-driven channel harness for the SR protocol: unreliable packet
//! transit (loss, corruption, latency), logical timers, and scenario-based
//! test runs.

pub mod engine;
pub mod scenario_runner;
pub mod trace;

pub use engine::{LinkEventSummary, NodeId, Simulator};
pub use trace::SimulationReport;
