//! Energy soak: run a workload continuously for a fixed wall-clock window
//! while the machine is sampled in the background.

use crate::utils::error::{BeventError, Result};
use crate::utils::monitor::{MachineSample, MachineSampler};
use serde::Serialize;
use std::future::Future;
use std::hint::black_box;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy)]
pub struct SoakConfig {
    pub duration: Duration,
    pub sample_interval: Duration,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            sample_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SoakReport {
    pub name: String,
    pub duration_secs: f64,
    pub iterations: u64,
    pub throughput_per_sec: f64,
    pub energy_j: Option<f64>,
    pub avg_power_w: Option<f64>,
    pub avg_cpu_percent: Option<f32>,
    pub peak_memory_mb: Option<u64>,
    pub samples: Vec<MachineSample>,
}

impl SoakReport {
    pub fn log(&self) {
        tracing::info!(
            "🔋 {} soak: {} iterations in {:.2}s ({:.2} iter/s)",
            self.name,
            self.iterations,
            self.duration_secs,
            self.throughput_per_sec
        );
        match (self.energy_j, self.avg_power_w) {
            (Some(energy), Some(power)) => {
                tracing::info!("🔋 {} soak: {:.3} J, {:.2} W average", self.name, energy, power)
            }
            _ => tracing::info!("🔋 {} soak: energy not measured", self.name),
        }
        if let (Some(cpu), Some(peak)) = (self.avg_cpu_percent, self.peak_memory_mb) {
            tracing::info!("🔋 {} soak: {:.1}% CPU average, {}MB peak", self.name, cpu, peak);
        }
    }
}

/// Mean of the CPU readings present in `samples`.
pub fn average_cpu_percent(samples: &[MachineSample]) -> Option<f32> {
    let readings: Vec<f32> = samples.iter().filter_map(|s| s.cpu_percent).collect();
    if readings.is_empty() {
        return None;
    }
    Some(readings.iter().sum::<f32>() / readings.len() as f32)
}

/// Samples the machine every `every` until `shutdown` resolves, then takes
/// one last sample so the tail of the window is counted.
pub async fn sample_until<S>(
    mut sampler: MachineSampler,
    every: Duration,
    shutdown: S,
) -> (MachineSampler, Vec<MachineSample>)
where
    S: Future<Output = ()>,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    tokio::pin!(shutdown);
    let mut samples = Vec::new();
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => samples.push(sampler.sample()),
        }
    }
    samples.push(sampler.sample());

    (sampler, samples)
}

/// Like [`sample_until`], for a stop signal that can fail to install. A
/// failed signal is returned as the error instead of ending the window.
pub async fn sample_until_signal<S, E>(
    sampler: MachineSampler,
    every: Duration,
    signal: S,
) -> std::result::Result<(MachineSampler, Vec<MachineSample>), E>
where
    S: Future<Output = std::result::Result<(), E>>,
{
    let mut failure = None;
    let outcome = sample_until(sampler, every, async {
        if let Err(e) = signal.await {
            failure = Some(e);
        }
    })
    .await;

    match failure {
        Some(e) => Err(e),
        None => Ok(outcome),
    }
}

/// Calls `workload` back to back on a blocking thread until `config.duration`
/// has elapsed. The deadline is checked between calls, never during one.
pub async fn run_soak<F, T>(
    name: &str,
    config: SoakConfig,
    sampler: MachineSampler,
    mut workload: F,
) -> Result<SoakReport>
where
    F: FnMut() -> Result<T> + Send + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let every = config.sample_interval;
    let sampling = tokio::spawn(sample_until(sampler, every, async move {
        let _ = stop_rx.changed().await;
    }));

    tracing::info!(
        "🔋 Starting {} soak for {:.1}s (sampling every {:?})",
        name,
        config.duration.as_secs_f64(),
        every
    );

    let deadline = config.duration;
    let outcome = tokio::task::spawn_blocking(move || -> Result<(u64, Duration)> {
        let start = Instant::now();
        let mut iterations = 0u64;
        while start.elapsed() < deadline {
            black_box(workload()?);
            iterations += 1;
        }
        Ok((iterations, start.elapsed()))
    })
    .await;

    let _ = stop_tx.send(true);
    let (sampler, samples) = sampling.await.map_err(|e| BeventError::BenchmarkError {
        message: format!("{} soak sampler failed: {}", name, e),
    })?;

    let (iterations, elapsed) = outcome.map_err(|e| BeventError::BenchmarkError {
        message: format!("{} soak workload panicked: {}", name, e),
    })??;

    let duration_secs = elapsed.as_secs_f64();
    let energy_j = sampler.total_energy_j();
    let report = SoakReport {
        name: name.to_string(),
        duration_secs,
        iterations,
        throughput_per_sec: if duration_secs > 0.0 {
            iterations as f64 / duration_secs
        } else {
            0.0
        },
        energy_j,
        avg_power_w: energy_j.filter(|_| duration_secs > 0.0).map(|j| j / duration_secs),
        avg_cpu_percent: average_cpu_percent(&samples),
        peak_memory_mb: sampler.peak_memory_mb(),
        samples,
    };
    report.log();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::EnergyProbe;
    use crate::utils::monitor::{NullProbe, SystemMonitor};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct CountingProbe(AtomicU64);

    impl EnergyProbe for CountingProbe {
        fn read_energy_uj(&self) -> Option<u64> {
            Some(self.0.fetch_add(1_000, Ordering::SeqCst))
        }
    }

    fn quick_config() -> SoakConfig {
        SoakConfig {
            duration: Duration::from_millis(150),
            sample_interval: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_soak_counts_iterations() {
        let sampler = MachineSampler::new(SystemMonitor::new(false), Arc::new(NullProbe));
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();

        let report = run_soak("count", quick_config(), sampler, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();

        assert!(report.iterations > 0);
        assert_eq!(report.iterations, calls.load(Ordering::SeqCst));
        assert!(report.duration_secs >= 0.15);
        assert!(report.throughput_per_sec > 0.0);
        assert!(report.energy_j.is_none());
        assert!(!report.samples.is_empty());
    }

    #[tokio::test]
    async fn test_soak_reports_energy_when_probe_present() {
        let probe = Arc::new(CountingProbe(AtomicU64::new(0)));
        let sampler = MachineSampler::new(SystemMonitor::new(false), probe);

        let report = run_soak("energy", quick_config(), sampler, || Ok(()))
            .await
            .unwrap();

        let energy = report.energy_j.unwrap();
        assert!(energy > 0.0);
        assert!(report.avg_power_w.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_soak_workload_error_propagates() {
        let sampler = MachineSampler::new(SystemMonitor::new(false), Arc::new(NullProbe));

        let result = run_soak("fails", quick_config(), sampler, || -> Result<()> {
            Err(BeventError::BenchmarkError {
                message: "boom".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
    }

    fn sample_with_cpu(cpu_percent: Option<f32>) -> MachineSample {
        MachineSample {
            timestamp: chrono::Utc::now(),
            elapsed_secs: 0.0,
            energy_j: None,
            power_w: None,
            cpu_percent,
            memory_mb: None,
        }
    }

    #[test]
    fn test_average_cpu_skips_missing_readings() {
        let samples = vec![
            sample_with_cpu(Some(40.0)),
            sample_with_cpu(None),
            sample_with_cpu(Some(80.0)),
        ];

        assert_eq!(average_cpu_percent(&samples), Some(60.0));
        assert_eq!(average_cpu_percent(&[sample_with_cpu(None)]), None);
        assert_eq!(average_cpu_percent(&[]), None);
    }

    #[tokio::test]
    async fn test_sample_until_signal_reports_failed_signal() {
        let sampler = MachineSampler::new(SystemMonitor::new(false), Arc::new(NullProbe));
        let result = sample_until_signal(sampler, Duration::from_millis(10), async {
            Err::<(), _>(std::io::Error::other("no signal handler"))
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "no signal handler");
    }

    #[tokio::test]
    async fn test_sample_until_signal_samples_until_signal() {
        let sampler = MachineSampler::new(SystemMonitor::new(false), Arc::new(NullProbe));
        let result = sample_until_signal(sampler, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(35)).await;
            Ok::<(), std::io::Error>(())
        })
        .await;

        let (_sampler, samples) = result.unwrap();
        assert!(samples.len() >= 2);
    }

    #[tokio::test]
    async fn test_sample_until_stops_on_shutdown() {
        let sampler = MachineSampler::new(SystemMonitor::new(false), Arc::new(NullProbe));
        let (_sampler, samples) = sample_until(
            sampler,
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_millis(55)),
        )
        .await;

        assert!(samples.len() >= 2);
    }
}
