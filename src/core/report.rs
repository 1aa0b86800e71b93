use crate::core::bench::{BenchMode, BenchStats};
use crate::core::dataset::DatasetSpec;
use crate::core::soak::SoakReport;
use crate::utils::error::{BeventError, Result};
use crate::utils::monitor::MachineSample;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const JSON_REPORT_FILE: &str = "benchmark_report.json";
pub const CSV_REPORT_FILE: &str = "benchmark_report.csv";
pub const SAMPLES_CSV_FILE: &str = "emissions.csv";

pub const SUPPORTED_FORMATS: [&str; 2] = ["json", "csv"];

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub dataset: DatasetSpec,
    pub matched_services: usize,
    pub benchmarks: Vec<BenchStats>,
    pub soak: Option<SoakReport>,
    /// Naive mean latency divided by optimized mean latency.
    pub speedup: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    report: &'a str,
    benchmark: &'a str,
    mode: BenchMode,
    rounds: usize,
    iterations: usize,
    min_ms: f64,
    max_ms: f64,
    mean_ms: f64,
    median_ms: f64,
    stddev_ms: f64,
    ops: f64,
}

impl BenchmarkReport {
    pub fn new(name: &str, dataset: DatasetSpec, matched_services: usize) -> Self {
        Self {
            name: name.to_string(),
            generated_at: Utc::now(),
            dataset,
            matched_services,
            benchmarks: Vec::new(),
            soak: None,
            speedup: None,
        }
    }

    pub fn push(&mut self, stats: BenchStats) {
        self.benchmarks.push(stats);
    }

    pub fn find(&self, name: &str, mode: BenchMode) -> Option<&BenchStats> {
        self.benchmarks
            .iter()
            .find(|b| b.name == name && b.mode == mode)
    }

    /// Sets `speedup` from the auto-mode runs of the two named benchmarks.
    pub fn compute_speedup(&mut self, optimized: &str, baseline: &str) {
        self.speedup = match (
            self.find(optimized, BenchMode::Auto),
            self.find(baseline, BenchMode::Auto),
        ) {
            (Some(fast), Some(slow)) if fast.mean_secs > 0.0 => {
                Some(slow.mean_secs / fast.mean_secs)
            }
            _ => None,
        };
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// One row per benchmark, times in milliseconds.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for b in &self.benchmarks {
            writer.serialize(CsvRow {
                report: &self.name,
                benchmark: &b.name,
                mode: b.mode,
                rounds: b.rounds,
                iterations: b.iterations,
                min_ms: b.min_secs * 1e3,
                max_ms: b.max_secs * 1e3,
                mean_ms: b.mean_secs * 1e3,
                median_ms: b.median_secs * 1e3,
                stddev_ms: b.stddev_secs * 1e3,
                ops: b.ops,
            })?;
        }
        into_bytes(writer)
    }
}

/// Machine samples as CSV, one row per sample.
pub fn samples_to_csv(samples: &[MachineSample]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for sample in samples {
        writer.serialize(sample)?;
    }
    into_bytes(writer)
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| BeventError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(name: &str, mode: BenchMode, mean: f64) -> BenchStats {
        BenchStats {
            name: name.to_string(),
            mode,
            rounds: 10,
            iterations: 1,
            min_secs: mean / 2.0,
            max_secs: mean * 2.0,
            mean_secs: mean,
            median_secs: mean,
            stddev_secs: 0.0,
            ops: 1.0 / mean,
        }
    }

    #[test]
    fn test_speedup_uses_auto_runs() {
        let mut report = BenchmarkReport::new("r", DatasetSpec::default(), 5_000);
        report.push(stats("optimized", BenchMode::Auto, 0.001));
        report.push(stats("optimized", BenchMode::Pedantic, 0.5));
        report.push(stats("naive", BenchMode::Auto, 0.25));

        report.compute_speedup("optimized", "naive");

        assert!((report.speedup.unwrap() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_speedup_missing_baseline() {
        let mut report = BenchmarkReport::new("r", DatasetSpec::default(), 5_000);
        report.push(stats("optimized", BenchMode::Auto, 0.001));
        report.compute_speedup("optimized", "naive");
        assert!(report.speedup.is_none());
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let mut report = BenchmarkReport::new("r", DatasetSpec::default(), 5_000);
        report.push(stats("optimized", BenchMode::Auto, 0.002));
        report.push(stats("naive", BenchMode::Auto, 0.2));

        let csv = String::from_utf8(report.to_csv().unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("report,benchmark,mode,rounds,iterations,min_ms"));
        assert!(lines[1].starts_with("r,optimized,auto,10,1,"));
        assert!(lines[2].starts_with("r,naive,auto,"));
    }

    #[test]
    fn test_json_contains_dataset() {
        let report = BenchmarkReport::new("r", DatasetSpec::default(), 5_000);
        let value: serde_json::Value = serde_json::from_slice(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["dataset"]["suppliers"], 1_000);
        assert_eq!(value["matched_services"], 5_000);
        assert!(value["soak"].is_null());
    }
}
