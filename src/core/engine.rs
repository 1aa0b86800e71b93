use crate::core::bench::{BenchStats, BenchmarkRunner};
use crate::core::dataset::{DatasetSpec, SyntheticDataset};
use crate::core::filter::{filter_services_by_supplier, filter_services_by_supplier_naive};
use crate::core::report::{
    samples_to_csv, BenchmarkReport, CSV_REPORT_FILE, JSON_REPORT_FILE, SAMPLES_CSV_FILE,
};
use crate::core::soak::{run_soak, SoakConfig};
use crate::core::{ConfigProvider, EnergyProbe, Storage};
use crate::utils::error::{BeventError, Result};
use crate::utils::monitor::{MachineSampler, NullProbe, SystemMonitor};
use std::sync::Arc;
use std::time::Duration;

pub const OPTIMIZED_BENCH: &str = "filter_services_by_supplier";
pub const NAIVE_BENCH: &str = "filter_services_by_supplier_naive";

#[derive(Debug, Clone, Copy)]
struct TimingPlan {
    warmup_rounds: usize,
    rounds: usize,
    pedantic_rounds: usize,
    pedantic_iterations: usize,
    include_naive: bool,
}

/// Runs the whole measurement: dataset, parity check, latency benchmarks,
/// energy soak, report files.
pub struct BenchEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    monitor: SystemMonitor,
    probe: Arc<dyn EnergyProbe>,
}

impl<S: Storage, C: ConfigProvider> BenchEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self::new_with_monitoring(storage, config, false)
    }

    pub fn new_with_monitoring(storage: S, config: C, monitor_enabled: bool) -> Self {
        Self {
            storage,
            config,
            monitor: SystemMonitor::new(monitor_enabled),
            probe: Arc::new(NullProbe),
        }
    }

    pub fn with_energy_probe(mut self, probe: Arc<dyn EnergyProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub async fn run(&self) -> Result<BenchmarkReport> {
        let name = self.config.benchmark_name();
        tracing::info!("🚀 Starting benchmark '{}'", name);
        self.monitor.log_stats("Start");

        let spec = DatasetSpec {
            suppliers: self.config.supplier_count(),
            services: self.config.service_count(),
            modulus: self.config.supplier_modulus(),
        };
        let dataset = Arc::new(SyntheticDataset::generate(spec)?);
        tracing::info!(
            "📦 Dataset ready: {} suppliers, {} services",
            dataset.suppliers.len(),
            dataset.services.len()
        );

        let matched = verify_parity(&dataset)?;
        tracing::info!("✅ Optimized and naive filters agree on {} matches", matched);
        self.monitor.log_stats("Dataset");

        let plan = TimingPlan {
            warmup_rounds: self.config.warmup_rounds(),
            rounds: self.config.rounds(),
            pedantic_rounds: self.config.pedantic_rounds(),
            pedantic_iterations: self.config.pedantic_iterations(),
            include_naive: self.config.include_naive(),
        };
        let data = dataset.clone();
        let benchmarks = tokio::task::spawn_blocking(move || run_latency_benchmarks(&data, plan))
            .await
            .map_err(|e| BeventError::BenchmarkError {
                message: format!("latency benchmarks panicked: {}", e),
            })??;
        self.monitor.log_stats("Latency");

        let mut report = BenchmarkReport::new(name, spec, matched);
        for stats in benchmarks {
            report.push(stats);
        }
        report.compute_speedup(OPTIMIZED_BENCH, NAIVE_BENCH);
        if let Some(speedup) = report.speedup {
            tracing::info!(
                "🏁 Optimized filter is {:.1}x faster than the naive baseline",
                speedup
            );
        }

        let soak_secs = self.config.soak_duration_secs();
        if soak_secs > 0.0 {
            let soak_config = SoakConfig {
                duration: Duration::from_secs_f64(soak_secs),
                sample_interval: Duration::from_millis(self.config.sample_interval_ms()),
            };
            // process stats feed the soak report whether or not phases are logged
            let sampler = MachineSampler::new(SystemMonitor::new(true), self.probe.clone());
            let data = dataset.clone();
            let soak = run_soak(OPTIMIZED_BENCH, soak_config, sampler, move || {
                filter_services_by_supplier(&data.services, &data.suppliers)
            })
            .await?;
            report.soak = Some(soak);
            self.monitor.log_stats("Soak");
        }

        self.write_report(&report).await?;
        self.monitor.log_final_stats();

        Ok(report)
    }

    async fn write_report(&self, report: &BenchmarkReport) -> Result<()> {
        for format in self.config.output_formats() {
            match format.as_str() {
                "json" => {
                    self.storage
                        .write_file(JSON_REPORT_FILE, &report.to_json()?)
                        .await?;
                    tracing::info!("📁 Wrote {}", JSON_REPORT_FILE);
                }
                "csv" => {
                    self.storage
                        .write_file(CSV_REPORT_FILE, &report.to_csv()?)
                        .await?;
                    tracing::info!("📁 Wrote {}", CSV_REPORT_FILE);

                    if let Some(soak) = report.soak.as_ref().filter(|s| !s.samples.is_empty()) {
                        self.storage
                            .write_file(SAMPLES_CSV_FILE, &samples_to_csv(&soak.samples)?)
                            .await?;
                        tracing::info!("📁 Wrote {}", SAMPLES_CSV_FILE);
                    }
                }
                other => {
                    return Err(BeventError::InvalidConfigValueError {
                        field: "output_formats".to_string(),
                        value: other.to_string(),
                        reason: "Unsupported report format".to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

/// Checks the optimized filter against the naive one and against the
/// count the dataset shape predicts. Returns the number of matches.
pub fn verify_parity(dataset: &SyntheticDataset) -> Result<usize> {
    let fast = filter_services_by_supplier(&dataset.services, &dataset.suppliers)?;
    let naive = filter_services_by_supplier_naive(&dataset.services, &dataset.suppliers)?;

    if fast != naive {
        let first_diff = fast
            .iter()
            .zip(naive.iter())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| fast.len().min(naive.len()));
        return Err(BeventError::ParityError {
            message: format!(
                "optimized returned {} services, naive {}; first difference at position {}",
                fast.len(),
                naive.len(),
                first_diff
            ),
        });
    }

    let expected = dataset.spec.expected_matches();
    if fast.len() != expected {
        return Err(BeventError::ParityError {
            message: format!(
                "expected {} matches, both filters returned {}",
                expected,
                fast.len()
            ),
        });
    }

    Ok(fast.len())
}

fn run_latency_benchmarks(
    dataset: &SyntheticDataset,
    plan: TimingPlan,
) -> Result<Vec<BenchStats>> {
    let runner = BenchmarkRunner::new(plan.warmup_rounds, plan.rounds);
    let services = &dataset.services;
    let suppliers = &dataset.suppliers;
    let mut results = Vec::new();

    results.push(runner.run(OPTIMIZED_BENCH, || {
        filter_services_by_supplier(services, suppliers)
    })?);

    if plan.include_naive {
        results.push(runner.run(NAIVE_BENCH, || {
            filter_services_by_supplier_naive(services, suppliers)
        })?);
    }

    results.push(runner.run_pedantic(
        OPTIMIZED_BENCH,
        plan.pedantic_rounds,
        plan.pedantic_iterations,
        || filter_services_by_supplier(services, suppliers),
    )?);

    Ok(results)
}
