pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "bevent-sustain")]
#[command(about = "Benchmark the supplier/service filter for latency and energy")]
pub struct CliConfig {
    #[arg(long, default_value = "supplier-filter")]
    pub name: String,

    #[arg(long, default_value = "1000")]
    pub suppliers: usize,

    #[arg(long, default_value = "10000")]
    pub services: usize,

    /// Service `i` is offered by supplier `i % modulus`
    #[arg(long, default_value = "2000")]
    pub modulus: usize,

    #[arg(long, default_value = "5")]
    pub warmup: usize,

    #[arg(long, default_value = "100")]
    pub rounds: usize,

    #[arg(long, default_value = "50")]
    pub pedantic_rounds: usize,

    #[arg(long, default_value = "10")]
    pub iterations: usize,

    /// Soak length in seconds, 0 disables the soak
    #[arg(long, default_value = "5")]
    pub soak_secs: f64,

    #[arg(long, default_value = "100")]
    pub sample_ms: u64,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_values = ["json", "csv"])]
    pub formats: Vec<String>,

    #[arg(long, help = "Do not benchmark the linear-scan baseline")]
    pub skip_naive: bool,

    #[arg(long, help = "Log process CPU and memory between phases")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn benchmark_name(&self) -> &str {
        &self.name
    }

    fn supplier_count(&self) -> usize {
        self.suppliers
    }

    fn service_count(&self) -> usize {
        self.services
    }

    fn supplier_modulus(&self) -> usize {
        self.modulus
    }

    fn warmup_rounds(&self) -> usize {
        self.warmup
    }

    fn rounds(&self) -> usize {
        self.rounds
    }

    fn pedantic_rounds(&self) -> usize {
        self.pedantic_rounds
    }

    fn pedantic_iterations(&self) -> usize {
        self.iterations
    }

    fn soak_duration_secs(&self) -> f64 {
        self.soak_secs
    }

    fn sample_interval_ms(&self) -> u64 {
        self.sample_ms
    }

    fn include_naive(&self) -> bool {
        !self.skip_naive
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("name", &self.name)?;
        validation::validate_positive_number("modulus", self.modulus, 1)?;
        validation::validate_positive_number("rounds", self.rounds, 1)?;
        validation::validate_positive_number("pedantic_rounds", self.pedantic_rounds, 1)?;
        validation::validate_positive_number("iterations", self.iterations, 1)?;
        validation::validate_range("soak_secs", self.soak_secs, 0.0, 3600.0)?;
        validation::validate_range("sample_ms", self.sample_ms, 1, 60_000)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_formats("formats", &self.formats)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_dataset() {
        let config = CliConfig::parse_from(["bevent-sustain"]);

        assert_eq!(config.suppliers, 1_000);
        assert_eq!(config.services, 10_000);
        assert_eq!(config.modulus, 2_000);
        assert_eq!(config.pedantic_rounds, 50);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.formats, vec!["json".to_string(), "csv".to_string()]);
        assert!(config.include_naive());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_modulus_and_unknown_format() {
        let config = CliConfig::parse_from(["bevent-sustain", "--modulus", "0"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["bevent-sustain", "--formats", "json,xml"]);
        assert!(config.validate().is_err());
    }
}
