use serde::Serialize;
use sr_lab_abstract::SimConfig;

use crate::engine::LinkEventSummary;

/// Serializable snapshot of a finished simulation, written as JSON by the
/// CLI's `--trace-out`.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub config: SimConfig,
    pub duration_ms: u64,
    pub delivered_data: Vec<Vec<u8>>,
    pub sender_packet_count: u32,
    pub link_events: Vec<LinkEventSummary>,
}
