//! Samples machine energy and load until Ctrl+C, for measuring an external
//! load generator hitting the server.

use bevent_sustain::core::report::{samples_to_csv, SAMPLES_CSV_FILE};
use bevent_sustain::core::soak::sample_until_signal;
use bevent_sustain::core::Storage;
use bevent_sustain::utils::logger;
use bevent_sustain::utils::monitor::{detect_energy_probe, MachineSampler, SystemMonitor};
use bevent_sustain::LocalStorage;
use clap::Parser;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "energy-monitor")]
#[command(about = "Record energy draw until interrupted")]
struct Args {
    /// Seconds between samples
    #[arg(long, default_value = "2")]
    interval_secs: u64,

    /// Directory that receives emissions.csv
    #[arg(long, default_value = ".")]
    output_path: String,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    if args.interval_secs == 0 {
        anyhow::bail!("--interval-secs must be at least 1");
    }

    let sampler = MachineSampler::new(SystemMonitor::new(true), detect_energy_probe());

    println!("--- ENERGY MONITORING STARTED ---");
    println!(">> Start the load generator now <<");
    println!("Press Ctrl+C here once the load generator has finished.");

    let (sampler, samples) = sample_until_signal(
        sampler,
        Duration::from_secs(args.interval_secs),
        tokio::signal::ctrl_c(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("cannot listen for Ctrl+C, nothing recorded: {}", e))?;

    let storage = LocalStorage::new(args.output_path.clone());
    storage
        .write_file(SAMPLES_CSV_FILE, &samples_to_csv(&samples)?)
        .await?;

    println!("--- MONITORING STOPPED, {} samples ---", samples.len());
    if let Some(energy) = sampler.total_energy_j() {
        println!("Total energy: {:.3} J", energy);
    }
    println!(
        "Data saved to {}",
        storage.full_path(SAMPLES_CSV_FILE).display()
    );

    Ok(())
}
