use crate::domain::ports::EnergyProbe;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, RefreshKind, System};

/// Package-0 RAPL zone exposed by the Linux powercap driver.
pub const DEFAULT_RAPL_ZONE: &str = "/sys/class/powercap/intel-rapl:0";

#[derive(Debug, Clone)]
pub struct SystemStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub memory_usage_percent: f32,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Arc<Mutex<System>>,
    pid: Option<Pid>,
    start_time: Instant,
    peak_memory: Arc<Mutex<u64>>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let mut system = System::new_with_specifics(RefreshKind::everything());

        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Process stats unavailable: {}", e);
                None
            }
        };

        system.refresh_all();

        Self {
            system: Arc::new(Mutex::new(system)),
            pid,
            start_time: Instant::now(),
            peak_memory: Arc::new(Mutex::new(0)),
            enabled,
        }
    }

    pub fn get_stats(&self) -> Option<SystemStats> {
        if !self.enabled {
            return None;
        }

        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.refresh_memory();

        let process = system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let total_memory = system.total_memory() / 1024 / 1024;
        let memory_percent = if total_memory > 0 {
            (memory_mb as f32 / total_memory as f32) * 100.0
        } else {
            0.0
        };

        let mut peak = self.peak_memory.lock().ok()?;
        if memory_mb > *peak {
            *peak = memory_mb;
        }
        let peak_memory = *peak;

        Some(SystemStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            memory_usage_percent: memory_percent,
            peak_memory_mb: peak_memory,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Time: {:?}",
                phase,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.memory_usage_percent,
                stats.peak_memory_mb,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// Without sysinfo there is nothing to sample.
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn get_stats(&self) -> Option<SystemStats> {
        None
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}
}

/// Reads the cumulative package energy counter from a powercap zone.
#[derive(Debug, Clone)]
pub struct RaplProbe {
    energy_path: PathBuf,
    max_range_uj: Option<u64>,
}

impl RaplProbe {
    pub fn detect() -> Option<Self> {
        Self::from_zone(DEFAULT_RAPL_ZONE)
    }

    /// Returns `None` when the zone has no readable `energy_uj`, which is
    /// the usual case without root or on non-Intel hosts.
    pub fn from_zone(zone: impl AsRef<Path>) -> Option<Self> {
        let zone = zone.as_ref();
        let energy_path = zone.join("energy_uj");
        read_counter(&energy_path)?;

        Some(Self {
            energy_path,
            max_range_uj: read_counter(&zone.join("max_energy_range_uj")),
        })
    }
}

impl EnergyProbe for RaplProbe {
    fn read_energy_uj(&self) -> Option<u64> {
        read_counter(&self.energy_path)
    }

    fn max_energy_uj(&self) -> Option<u64> {
        self.max_range_uj
    }
}

fn read_counter(path: &Path) -> Option<u64> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Stand-in probe for hosts without an energy counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl EnergyProbe for NullProbe {
    fn read_energy_uj(&self) -> Option<u64> {
        None
    }
}

/// Best probe available on this host.
pub fn detect_energy_probe() -> Arc<dyn EnergyProbe> {
    match RaplProbe::detect() {
        Some(probe) => {
            tracing::info!("⚡ Energy counter found at {}", DEFAULT_RAPL_ZONE);
            Arc::new(probe)
        }
        None => {
            tracing::warn!("⚡ No readable RAPL energy counter, energy will not be reported");
            Arc::new(NullProbe)
        }
    }
}

/// Microjoules consumed between two counter readings, accounting for one
/// wrap-around when the counter range is known.
pub fn energy_delta_uj(start: u64, end: u64, max_range: Option<u64>) -> Option<u64> {
    if end >= start {
        Some(end - start)
    } else {
        max_range.map(|max| max.saturating_sub(start) + end)
    }
}

/// One reading of the machine taken during a measurement window.
#[derive(Debug, Clone, Serialize)]
pub struct MachineSample {
    pub timestamp: DateTime<Utc>,
    pub elapsed_secs: f64,
    /// Energy since the previous sample, in joules.
    pub energy_j: Option<f64>,
    /// Average power since the previous sample, in watts.
    pub power_w: Option<f64>,
    pub cpu_percent: Option<f32>,
    pub memory_mb: Option<u64>,
}

/// Turns successive probe and process readings into [`MachineSample`]s.
pub struct MachineSampler {
    monitor: SystemMonitor,
    probe: Arc<dyn EnergyProbe>,
    started: Instant,
    last_at: Instant,
    last_energy_uj: Option<u64>,
    total_energy_uj: u64,
    energy_seen: bool,
}

impl std::fmt::Debug for MachineSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineSampler")
            .field("started", &self.started)
            .field("last_at", &self.last_at)
            .field("last_energy_uj", &self.last_energy_uj)
            .field("total_energy_uj", &self.total_energy_uj)
            .field("energy_seen", &self.energy_seen)
            .finish_non_exhaustive()
    }
}

impl MachineSampler {
    pub fn new(monitor: SystemMonitor, probe: Arc<dyn EnergyProbe>) -> Self {
        let now = Instant::now();
        let last_energy_uj = probe.read_energy_uj();
        Self {
            monitor,
            probe,
            started: now,
            last_at: now,
            last_energy_uj,
            total_energy_uj: 0,
            energy_seen: false,
        }
    }

    pub fn sample(&mut self) -> MachineSample {
        let now = Instant::now();
        let window = now.duration_since(self.last_at).as_secs_f64();
        let reading = self.probe.read_energy_uj();

        let delta_uj = match (self.last_energy_uj, reading) {
            (Some(start), Some(end)) => energy_delta_uj(start, end, self.probe.max_energy_uj()),
            _ => None,
        };
        if let Some(delta) = delta_uj {
            self.total_energy_uj += delta;
            self.energy_seen = true;
        }

        // A failed read keeps the last good counter and window start, so the
        // next good read covers the gap.
        if reading.is_some() || self.last_energy_uj.is_none() {
            self.last_energy_uj = reading;
            self.last_at = now;
        }

        let energy_j = delta_uj.map(|uj| uj as f64 / 1_000_000.0);
        let stats = self.monitor.get_stats();

        MachineSample {
            timestamp: Utc::now(),
            elapsed_secs: now.duration_since(self.started).as_secs_f64(),
            energy_j,
            power_w: energy_j.filter(|_| window > 0.0).map(|j| j / window),
            cpu_percent: stats.as_ref().map(|s| s.cpu_usage),
            memory_mb: stats.as_ref().map(|s| s.memory_usage_mb),
        }
    }

    /// Joules accumulated over every sample so far.
    pub fn total_energy_j(&self) -> Option<f64> {
        self.energy_seen
            .then(|| self.total_energy_uj as f64 / 1_000_000.0)
    }

    pub fn peak_memory_mb(&self) -> Option<u64> {
        self.monitor.get_stats().map(|s| s.peak_memory_mb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct SteppingProbe {
        value: AtomicU64,
        step: u64,
    }

    impl EnergyProbe for SteppingProbe {
        fn read_energy_uj(&self) -> Option<u64> {
            Some(self.value.fetch_add(self.step, Ordering::SeqCst))
        }
    }

    #[test]
    fn test_energy_delta_wraps_once() {
        assert_eq!(energy_delta_uj(100, 250, None), Some(150));
        assert_eq!(energy_delta_uj(900, 100, Some(1_000)), Some(200));
        assert_eq!(energy_delta_uj(900, 100, None), None);
    }

    #[test]
    fn test_rapl_probe_reads_zone_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("energy_uj"), "123456\n").unwrap();
        std::fs::write(dir.path().join("max_energy_range_uj"), "262143328850\n").unwrap();

        let probe = RaplProbe::from_zone(dir.path()).unwrap();
        assert_eq!(probe.read_energy_uj(), Some(123_456));
        assert_eq!(probe.max_energy_uj(), Some(262_143_328_850));
    }

    #[test]
    fn test_rapl_probe_missing_zone() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(RaplProbe::from_zone(dir.path().join("nope")).is_none());
    }

    #[test]
    fn test_sampler_accumulates_energy() {
        let probe = Arc::new(SteppingProbe {
            value: AtomicU64::new(0),
            step: 2_000_000,
        });
        let mut sampler = MachineSampler::new(SystemMonitor::new(false), probe);

        let first = sampler.sample();
        let second = sampler.sample();

        assert_eq!(first.energy_j, Some(2.0));
        assert_eq!(second.energy_j, Some(2.0));
        assert_eq!(sampler.total_energy_j(), Some(4.0));
        assert!(first.cpu_percent.is_none());
    }

    /// Replays a fixed list of counter readings, `None` being a failed read.
    struct ScriptedProbe {
        readings: Mutex<std::vec::IntoIter<Option<u64>>>,
    }

    impl ScriptedProbe {
        fn new(readings: Vec<Option<u64>>) -> Self {
            Self {
                readings: Mutex::new(readings.into_iter()),
            }
        }
    }

    impl EnergyProbe for ScriptedProbe {
        fn read_energy_uj(&self) -> Option<u64> {
            self.readings.lock().unwrap().next().flatten()
        }
    }

    #[test]
    fn test_sampler_bridges_failed_reads() {
        let probe = Arc::new(ScriptedProbe::new(vec![
            Some(0),
            Some(1_000_000),
            None,
            Some(3_000_000),
            Some(4_000_000),
        ]));
        let mut sampler = MachineSampler::new(SystemMonitor::new(false), probe);

        let energies: Vec<Option<f64>> = (0..4).map(|_| sampler.sample().energy_j).collect();

        assert_eq!(energies, vec![Some(1.0), None, Some(2.0), Some(1.0)]);
        assert_eq!(sampler.total_energy_j(), Some(4.0));
    }

    #[test]
    fn test_sampler_without_probe() {
        let mut sampler = MachineSampler::new(SystemMonitor::new(false), Arc::new(NullProbe));
        let sample = sampler.sample();

        assert!(sample.energy_j.is_none());
        assert!(sample.power_w.is_none());
        assert!(sampler.total_energy_j().is_none());
    }
}
