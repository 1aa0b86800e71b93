use bevent_sustain::utils::monitor::detect_energy_probe;
use bevent_sustain::utils::{logger, validation::Validate};
use bevent_sustain::{BenchEngine, CliConfig, LocalStorage};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting bevent-sustain");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let output_path = config.output_path.clone();
    let engine = BenchEngine::new_with_monitoring(storage, config, monitor_enabled)
        .with_energy_probe(detect_energy_probe());

    match engine.run().await {
        Ok(report) => {
            println!("✅ Benchmark '{}' completed", report.name);
            for b in &report.benchmarks {
                println!(
                    "   {} [{:?}]: mean {:.3}ms, {:.1} ops/s",
                    b.name,
                    b.mode,
                    b.mean_secs * 1e3,
                    b.ops
                );
            }
            if let Some(speedup) = report.speedup {
                println!("   speedup over naive: {:.1}x", speedup);
            }
            if let Some(soak) = &report.soak {
                println!(
                    "   soak: {} iterations, {:.2} iter/s",
                    soak.iterations, soak.throughput_per_sec
                );
                if let Some(energy) = soak.energy_j {
                    println!("   energy: {:.3} J", energy);
                }
            }
            println!("📁 Reports saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Benchmark failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
