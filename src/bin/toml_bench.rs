use bevent_sustain::config::toml_config::{SoakSection, TomlConfig};
use bevent_sustain::core::ConfigProvider;
use bevent_sustain::utils::monitor::detect_energy_probe;
use bevent_sustain::utils::{logger, validation::Validate};
use bevent_sustain::{BenchEngine, LocalStorage};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-bench")]
#[command(about = "Filter benchmark driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "bench-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the soak length from config, in seconds
    #[arg(long)]
    soak_secs: Option<f64>,

    /// Show what would run without measuring anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_cli_logger_with_level(args.verbose, config.log_level());

    tracing::info!("🚀 Starting TOML-driven benchmark");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    if let Some(secs) = args.soak_secs {
        let soak = config.soak.get_or_insert(SoakSection {
            enabled: true,
            duration_secs: None,
            sample_interval_ms: None,
        });
        soak.enabled = secs > 0.0;
        soak.duration_secs = Some(secs);
        tracing::info!("🔧 Soak length overridden to: {}s", secs);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No measurement will occur");
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let engine = BenchEngine::new_with_monitoring(storage, config, monitor_enabled)
        .with_energy_probe(detect_energy_probe());

    match engine.run().await {
        Ok(report) => {
            println!(
                "✅ Benchmark '{}' completed: {} matches, {} benchmarks",
                report.name,
                report.matched_services,
                report.benchmarks.len()
            );
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

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    let spec = config.dataset_spec();
    tracing::info!("📋 Benchmark: {}", config.benchmark.name);
    if let Some(description) = &config.benchmark.description {
        tracing::info!("   {}", description);
    }
    tracing::info!(
        "📦 Dataset: {} suppliers, {} services, modulus {} ({} expected matches)",
        spec.suppliers,
        spec.services,
        spec.modulus,
        spec.expected_matches()
    );
    tracing::info!(
        "⏱️  Timing: {} warmup + {} rounds, pedantic {} × {}, naive baseline: {}",
        config.warmup_rounds(),
        config.rounds(),
        config.pedantic_rounds(),
        config.pedantic_iterations(),
        config.include_naive()
    );
    let soak_secs = config.soak_duration_secs();
    if soak_secs > 0.0 {
        tracing::info!(
            "🔋 Soak: {}s, sampling every {}ms",
            soak_secs,
            config.sample_interval_ms()
        );
    } else {
        tracing::info!("🔋 Soak: disabled");
    }
    tracing::info!(
        "📁 Output: {} ({})",
        config.output_path(),
        config.output_formats().join(", ")
    );
}
