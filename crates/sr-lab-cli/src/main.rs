use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use sr_lab_abstract::{SimConfig, TransportProtocol};
use sr_lab_core::{ProtocolConfig, SrReceiver, SrSender};
use sr_lab_simulator::{SimulationReport, Simulator, scenario_runner};

#[derive(Parser, Debug)]
#[command(author, version, about = "Selective Repeat protocol simulator")]
struct Args {
    /// Run a scenario file instead of the default message batch.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Probability that a packet is dropped in transit.
    #[arg(long, default_value_t = 0.1)]
    loss_rate: f64,

    /// Probability that a packet is corrupted in transit.
    #[arg(long, default_value_t = 0.0)]
    corrupt_rate: f64,

    /// Lower bound of the one-way latency in ms.
    #[arg(long, default_value_t = 10)]
    min_latency: u64,

    /// Upper bound of the one-way latency in ms.
    #[arg(long, default_value_t = 100)]
    max_latency: u64,

    /// Channel RNG seed; identical seeds replay identical runs.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Sender/receiver window size.
    #[arg(long, default_value_t = 8)]
    window_size: u32,

    /// Packet ring capacity; must strictly exceed the window size.
    #[arg(long, default_value_t = 50)]
    buffer_capacity: u32,

    /// Retransmission timeout in ms.
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,

    /// Number of messages in the default batch.
    #[arg(long, default_value_t = 10)]
    messages: u32,

    /// Write a JSON trace of the finished simulation.
    #[arg(long)]
    trace_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    anyhow::ensure!(
        args.buffer_capacity > args.window_size,
        "--buffer-capacity must strictly exceed --window-size"
    );
    anyhow::ensure!(
        args.min_latency <= args.max_latency,
        "--min-latency must not exceed --max-latency"
    );

    let protocol = ProtocolConfig {
        window_size: args.window_size,
        buffer_capacity: args.buffer_capacity,
        timeout_ms: args.timeout_ms,
    };
    let sender: Box<dyn TransportProtocol> = Box::new(SrSender::new(protocol));
    let receiver: Box<dyn TransportProtocol> = Box::new(SrReceiver::new(protocol));

    let report = if let Some(path) = &args.scenario {
        scenario_runner::run_scenario(path, sender, receiver)?
    } else {
        run_default_sim(&args, sender, receiver)
    };

    info!(
        "Done: {} payloads delivered, {} packets sent, {}ms simulated",
        report.delivered_data.len(),
        report.sender_packet_count,
        report.duration_ms
    );

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
    }

    Ok(())
}

fn run_default_sim(
    args: &Args,
    sender: Box<dyn TransportProtocol>,
    receiver: Box<dyn TransportProtocol>,
) -> SimulationReport {
    let config = SimConfig {
        loss_rate: args.loss_rate,
        corrupt_rate: args.corrupt_rate,
        min_latency: args.min_latency,
        max_latency: args.max_latency,
        seed: args.seed,
    };
    let mut sim = Simulator::new(config, sender, receiver);
    for i in 0..args.messages {
        let text = format!("message {}", i + 1);
        sim.schedule_app_send(u64::from(i) * 500, text.into_bytes());
    }

    info!("Starting headless simulation with {} messages", args.messages);
    sim.run_until_complete();
    sim.export_report()
}

fn write_trace(path: &Path, report: &SimulationReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize simulation trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    Ok(())
}
