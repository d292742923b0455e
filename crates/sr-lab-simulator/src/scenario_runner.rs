//! Loads declarative TOML scenarios, runs them through the engine and
//! evaluates their assertions.

use anyhow::{Context, Result, bail};
use sr_lab_abstract::{SimConfig, TestAction, TestAssertion, TestScenario, TransportProtocol};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::engine::Simulator;
use crate::trace::SimulationReport;

pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    let scenario: TestScenario =
        toml::from_str(&content).context("Failed to parse scenario file")?;
    Ok(scenario)
}

/// Run a scenario file end to end and evaluate its assertions.
pub fn run_scenario(
    path: &Path,
    sender: Box<dyn TransportProtocol>,
    receiver: Box<dyn TransportProtocol>,
) -> Result<SimulationReport> {
    let scenario = load_scenario(path)?;
    run_loaded(&scenario, sender, receiver)
}

/// Run an already-parsed scenario and evaluate its assertions.
pub fn run_loaded(
    scenario: &TestScenario,
    sender: Box<dyn TransportProtocol>,
    receiver: Box<dyn TransportProtocol>,
) -> Result<SimulationReport> {
    info!("Running scenario '{}': {}", scenario.name, scenario.description);

    let mut config = SimConfig::default();
    scenario.config.apply_to(&mut config);

    let mut sim = Simulator::new(config, sender, receiver);
    configure_actions(&mut sim, &scenario.actions);
    sim.run_until_complete();

    let report = sim.export_report();
    check_assertions(scenario, &report)?;
    info!(
        "Scenario '{}' passed ({} assertions)",
        scenario.name,
        scenario.assertions.len()
    );
    Ok(report)
}

pub fn configure_actions(sim: &mut Simulator, actions: &[TestAction]) {
    for action in actions {
        match action {
            TestAction::AppSend { time, data } => {
                sim.schedule_app_send(*time, data.as_bytes().to_vec());
            }
            TestAction::DropNextFromSenderSeq { seq } => {
                sim.add_drop_sender_seq_once(*seq);
            }
            TestAction::DropNextFromReceiverAck { ack } => {
                sim.add_drop_receiver_ack_once(*ack);
            }
        }
    }
}

/// Delivered payloads are zero-padded to the fixed frame size; a match is
/// the expected text followed by padding only.
fn payload_matches(delivered: &[u8], expected: &str) -> bool {
    let expected = expected.as_bytes();
    delivered.len() >= expected.len()
        && &delivered[..expected.len()] == expected
        && delivered[expected.len()..].iter().all(|b| *b == 0)
}

fn check_assertions(scenario: &TestScenario, report: &SimulationReport) -> Result<()> {
    // DataDelivered assertions are positional: each must match at or after
    // the position of the previous one, so they also pin the delivery order.
    let mut delivery_cursor = 0usize;

    for assertion in &scenario.assertions {
        match assertion {
            TestAssertion::DataDelivered { data } => {
                let found = report.delivered_data[delivery_cursor..]
                    .iter()
                    .position(|d| payload_matches(d, data));
                match found {
                    Some(offset) => delivery_cursor += offset + 1,
                    None => bail!(
                        "scenario '{}': expected '{}' delivered at position >= {}, got {} deliveries",
                        scenario.name,
                        data,
                        delivery_cursor,
                        report.delivered_data.len()
                    ),
                }
            }
            TestAssertion::SenderPacketCount { min, max } => {
                let count = report.sender_packet_count;
                if count < *min {
                    bail!(
                        "scenario '{}': sender sent {} packets, expected at least {}",
                        scenario.name,
                        count,
                        min
                    );
                }
                if let Some(max) = max {
                    if count > *max {
                        bail!(
                            "scenario '{}': sender sent {} packets, expected at most {}",
                            scenario.name,
                            count,
                            max
                        );
                    }
                }
            }
            TestAssertion::MaxDuration { ms } => {
                if report.duration_ms > *ms {
                    bail!(
                        "scenario '{}': finished at {}ms, limit {}ms",
                        scenario.name,
                        report.duration_ms,
                        ms
                    );
                }
            }
        }
    }
    Ok(())
}
