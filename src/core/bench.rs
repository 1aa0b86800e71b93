//! Latency benchmarks: repeated timed calls and their summary statistics.

use crate::utils::error::{BeventError, Result};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchMode {
    /// Warmup, then one call per round.
    Auto,
    /// Fixed rounds and iterations per round, no warmup.
    Pedantic,
}

/// Summary of one benchmark. Times are seconds per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchStats {
    pub name: String,
    pub mode: BenchMode,
    pub rounds: usize,
    pub iterations: usize,
    pub min_secs: f64,
    pub max_secs: f64,
    pub mean_secs: f64,
    pub median_secs: f64,
    pub stddev_secs: f64,
    /// Calls per second at the mean latency.
    pub ops: f64,
}

impl BenchStats {
    /// Builds the summary from per-call timings. `timings` must not be empty.
    fn from_timings(
        name: &str,
        mode: BenchMode,
        iterations: usize,
        mut timings: Vec<f64>,
    ) -> Result<Self> {
        if timings.is_empty() {
            return Err(BeventError::BenchmarkError {
                message: format!("{}: no rounds were timed", name),
            });
        }

        timings.sort_by(|a, b| a.total_cmp(b));
        let n = timings.len();
        let mean = timings.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (timings[n / 2 - 1] + timings[n / 2]) / 2.0
        } else {
            timings[n / 2]
        };
        let stddev = if n > 1 {
            let var = timings.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        Ok(Self {
            name: name.to_string(),
            mode,
            rounds: n,
            iterations,
            min_secs: timings[0],
            max_secs: timings[n - 1],
            mean_secs: mean,
            median_secs: median,
            stddev_secs: stddev,
            ops: if mean > 0.0 { 1.0 / mean } else { 0.0 },
        })
    }

    pub fn log(&self) {
        tracing::info!(
            "⏱️  {} [{:?}] min {:.3}ms, max {:.3}ms, mean {:.3}ms ± {:.3}ms, {:.1} ops/s ({}×{})",
            self.name,
            self.mode,
            self.min_secs * 1e3,
            self.max_secs * 1e3,
            self.mean_secs * 1e3,
            self.stddev_secs * 1e3,
            self.ops,
            self.rounds,
            self.iterations
        );
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    warmup_rounds: usize,
    rounds: usize,
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self::new(5, 100)
    }
}

impl BenchmarkRunner {
    pub fn new(warmup_rounds: usize, rounds: usize) -> Self {
        Self {
            warmup_rounds,
            rounds,
        }
    }

    /// Times `f` once per round after the warmup calls.
    pub fn run<T, F>(&self, name: &str, mut f: F) -> Result<BenchStats>
    where
        F: FnMut() -> Result<T>,
    {
        check_positive(name, "rounds", self.rounds)?;

        for _ in 0..self.warmup_rounds {
            black_box(f()?);
        }

        let mut timings = Vec::with_capacity(self.rounds);
        for _ in 0..self.rounds {
            let start = Instant::now();
            black_box(f()?);
            timings.push(start.elapsed().as_secs_f64());
        }

        let stats = BenchStats::from_timings(name, BenchMode::Auto, 1, timings)?;
        stats.log();
        Ok(stats)
    }

    /// Times `rounds` batches of `iterations` back-to-back calls and
    /// reports the per-call time of each batch.
    pub fn run_pedantic<T, F>(
        &self,
        name: &str,
        rounds: usize,
        iterations: usize,
        mut f: F,
    ) -> Result<BenchStats>
    where
        F: FnMut() -> Result<T>,
    {
        check_positive(name, "rounds", rounds)?;
        check_positive(name, "iterations", iterations)?;

        let mut timings = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            let start = Instant::now();
            for _ in 0..iterations {
                black_box(f()?);
            }
            timings.push(start.elapsed().as_secs_f64() / iterations as f64);
        }

        let stats = BenchStats::from_timings(name, BenchMode::Pedantic, iterations, timings)?;
        stats.log();
        Ok(stats)
    }
}

fn check_positive(name: &str, what: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(BeventError::BenchmarkError {
            message: format!("{}: {} must be at least 1", name, what),
        });
    }
    Ok(())
}
