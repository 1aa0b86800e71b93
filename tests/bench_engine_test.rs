use anyhow::Result;
use bevent_sustain::config::toml_config::TomlConfig;
use bevent_sustain::core::bench::BenchMode;
use bevent_sustain::core::engine::{NAIVE_BENCH, OPTIMIZED_BENCH};
use bevent_sustain::core::report::{CSV_REPORT_FILE, JSON_REPORT_FILE, SAMPLES_CSV_FILE};
use bevent_sustain::core::EnergyProbe;
use bevent_sustain::{BenchEngine, BeventError, LocalStorage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct FakeRapl(AtomicU64);

impl EnergyProbe for FakeRapl {
    fn read_energy_uj(&self) -> Option<u64> {
        // 5 mJ per reading
        Some(self.0.fetch_add(5_000, Ordering::SeqCst))
    }
}

fn small_config(output_path: &str, extra: &str) -> Result<TomlConfig> {
    let content = format!(
        r#"
[benchmark]
name = "engine-test"

[dataset]
suppliers = 100
services = 1000
modulus = 200

[timing]
warmup_rounds = 1
rounds = 5
pedantic_rounds = 3
pedantic_iterations = 2

[output]
path = "{}"
formats = ["json", "csv"]
{}
"#,
        output_path, extra
    );
    Ok(TomlConfig::from_toml_str(&content)?)
}

#[tokio::test]
async fn test_engine_writes_reports() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let config = small_config(&output_path, "")?;

    let storage = LocalStorage::new(output_path.clone());
    let engine = BenchEngine::new(storage, config);
    let report = engine.run().await?;

    assert_eq!(report.matched_services, 500);
    assert_eq!(report.benchmarks.len(), 3);
    assert!(report.find(OPTIMIZED_BENCH, BenchMode::Auto).is_some());
    assert!(report.find(NAIVE_BENCH, BenchMode::Auto).is_some());
    let pedantic = report.find(OPTIMIZED_BENCH, BenchMode::Pedantic).unwrap();
    assert_eq!(pedantic.rounds, 3);
    assert_eq!(pedantic.iterations, 2);
    assert!(report.speedup.is_some());
    assert!(report.soak.is_none());

    let json_path = temp_dir.path().join(JSON_REPORT_FILE);
    let json: serde_json::Value = serde_json::from_slice(&std::fs::read(json_path)?)?;
    assert_eq!(json["name"], "engine-test");
    assert_eq!(json["benchmarks"].as_array().unwrap().len(), 3);

    let csv = std::fs::read_to_string(temp_dir.path().join(CSV_REPORT_FILE))?;
    assert_eq!(csv.lines().count(), 4);

    // no soak, no samples file
    assert!(!temp_dir.path().join(SAMPLES_CSV_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn test_engine_soak_with_energy_probe() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let config = small_config(
        &output_path,
        "\n[soak]\nenabled = true\nduration_secs = 0.3\nsample_interval_ms = 50\n",
    )?;

    let storage = LocalStorage::new(output_path.clone());
    let engine = BenchEngine::new(storage, config)
        .with_energy_probe(Arc::new(FakeRapl(AtomicU64::new(0))));
    let report = engine.run().await?;

    let soak = report.soak.expect("soak should have run");
    assert!(soak.iterations > 0);
    assert!(soak.throughput_per_sec > 0.0);
    assert!(soak.energy_j.unwrap() > 0.0);
    assert!(!soak.samples.is_empty());

    // process stats are sampled even though phase monitoring is off
    assert!(soak.peak_memory_mb.is_some());
    assert!(soak.avg_cpu_percent.is_some());
    assert!(soak.samples.iter().all(|s| s.cpu_percent.is_some()));
    assert!(soak.samples.iter().all(|s| s.memory_mb.is_some()));

    let samples = std::fs::read_to_string(temp_dir.path().join(SAMPLES_CSV_FILE))?;
    let header = samples.lines().next().unwrap();
    assert_eq!(
        header,
        "timestamp,elapsed_secs,energy_j,power_w,cpu_percent,memory_mb"
    );
    assert_eq!(samples.lines().count(), soak.samples.len() + 1);
    Ok(())
}

#[tokio::test]
async fn test_engine_without_naive_has_no_speedup() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let mut config = small_config(&output_path, "")?;
    config.timing.include_naive = Some(false);
    config.output.formats = vec!["json".to_string()];

    let engine = BenchEngine::new(LocalStorage::new(output_path.clone()), config);
    let report = engine.run().await?;

    assert_eq!(report.benchmarks.len(), 2);
    assert!(report.speedup.is_none());
    assert!(temp_dir.path().join(JSON_REPORT_FILE).exists());
    assert!(!temp_dir.path().join(CSV_REPORT_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn test_engine_rejects_zero_modulus() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let mut config = small_config(&output_path, "")?;
    config.dataset.modulus = Some(0);

    let engine = BenchEngine::new(LocalStorage::new(output_path), config);
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, BeventError::InvalidConfigValueError { .. }));
    Ok(())
}
