use crate::core::dataset::DatasetSpec;
use crate::core::ConfigProvider;
use crate::utils::error::{BeventError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub benchmark: BenchmarkSection,
    #[serde(default)]
    pub dataset: DatasetSection,
    #[serde(default)]
    pub timing: TimingSection,
    pub soak: Option<SoakSection>,
    pub output: OutputSection,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSection {
    pub suppliers: Option<usize>,
    pub services: Option<usize>,
    pub modulus: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingSection {
    pub warmup_rounds: Option<usize>,
    pub rounds: Option<usize>,
    pub pedantic_rounds: Option<usize>,
    pub pedantic_iterations: Option<usize>,
    pub include_naive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoakSection {
    pub enabled: bool,
    pub duration_secs: Option<f64>,
    pub sample_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: String,
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BeventError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BeventError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn dataset_spec(&self) -> DatasetSpec {
        let defaults = DatasetSpec::default();
        DatasetSpec {
            suppliers: self.dataset.suppliers.unwrap_or(defaults.suppliers),
            services: self.dataset.services.unwrap_or(defaults.services),
            modulus: self.dataset.modulus.unwrap_or(defaults.modulus),
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref()?.log_level.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("benchmark.name", &self.benchmark.name)?;

        let spec = self.dataset_spec();
        validation::validate_positive_number("dataset.modulus", spec.modulus, 1)?;

        validation::validate_positive_number("timing.rounds", self.rounds(), 1)?;
        validation::validate_positive_number("timing.pedantic_rounds", self.pedantic_rounds(), 1)?;
        validation::validate_positive_number(
            "timing.pedantic_iterations",
            self.pedantic_iterations(),
            1,
        )?;

        if let Some(soak) = &self.soak {
            if let Some(secs) = soak.duration_secs {
                validation::validate_range("soak.duration_secs", secs, 0.0, 3600.0)?;
            }
            if let Some(ms) = soak.sample_interval_ms {
                validation::validate_range("soak.sample_interval_ms", ms, 1, 60_000)?;
            }
        }

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_formats("output.formats", &self.output.formats)?;

        if let Some(level) = self.log_level() {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(BeventError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn benchmark_name(&self) -> &str {
        &self.benchmark.name
    }

    fn supplier_count(&self) -> usize {
        self.dataset_spec().suppliers
    }

    fn service_count(&self) -> usize {
        self.dataset_spec().services
    }

    fn supplier_modulus(&self) -> usize {
        self.dataset_spec().modulus
    }

    fn warmup_rounds(&self) -> usize {
        self.timing.warmup_rounds.unwrap_or(5)
    }

    fn rounds(&self) -> usize {
        self.timing.rounds.unwrap_or(100)
    }

    fn pedantic_rounds(&self) -> usize {
        self.timing.pedantic_rounds.unwrap_or(50)
    }

    fn pedantic_iterations(&self) -> usize {
        self.timing.pedantic_iterations.unwrap_or(10)
    }

    fn soak_duration_secs(&self) -> f64 {
        match &self.soak {
            Some(soak) if soak.enabled => soak.duration_secs.unwrap_or(5.0),
            _ => 0.0,
        }
    }

    fn sample_interval_ms(&self) -> u64 {
        self.soak
            .as_ref()
            .and_then(|s| s.sample_interval_ms)
            .unwrap_or(100)
    }

    fn include_naive(&self) -> bool {
        self.timing.include_naive.unwrap_or(true)
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[benchmark]
name = "minimal"

[output]
path = "./out"
formats = ["json"]
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.dataset_spec(), DatasetSpec::default());
        assert_eq!(config.rounds(), 100);
        assert_eq!(config.pedantic_rounds(), 50);
        assert_eq!(config.pedantic_iterations(), 10);
        assert_eq!(config.soak_duration_secs(), 0.0);
        assert!(config.include_naive());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let content = r#"
[benchmark]
name = "full"
description = "all sections"

[dataset]
suppliers = 10
services = 100
modulus = 20

[timing]
warmup_rounds = 1
rounds = 3
pedantic_rounds = 2
pedantic_iterations = 4
include_naive = false

[soak]
enabled = true
duration_secs = 0.5
sample_interval_ms = 25

[output]
path = "./out"
formats = ["json", "csv"]

[monitoring]
enabled = true
log_level = "debug"
"#;
        let config = TomlConfig::from_toml_str(content).unwrap();

        assert_eq!(config.supplier_count(), 10);
        assert_eq!(config.service_count(), 100);
        assert_eq!(config.supplier_modulus(), 20);
        assert_eq!(config.warmup_rounds(), 1);
        assert_eq!(config.soak_duration_secs(), 0.5);
        assert_eq!(config.sample_interval_ms(), 25);
        assert!(!config.include_naive());
        assert!(config.monitoring_enabled());
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("BEVENT_TEST_OUTPUT_DIR", "/tmp/bevent-out");
        let content = r#"
[benchmark]
name = "env"

[output]
path = "${BEVENT_TEST_OUTPUT_DIR}"
formats = ["csv"]
"#;
        let config = TomlConfig::from_toml_str(content).unwrap();
        assert_eq!(config.output_path(), "/tmp/bevent-out");
    }

    #[test]
    fn test_unknown_env_var_is_kept() {
        let out = TomlConfig::substitute_env_vars("path = \"${BEVENT_SURELY_UNSET_VAR}\"");
        assert_eq!(out, "path = \"${BEVENT_SURELY_UNSET_VAR}\"");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_rounds = format!("{}\n[timing]\nrounds = 0\n", MINIMAL);
        let config = TomlConfig::from_toml_str(&zero_rounds).unwrap();
        assert!(config.validate().is_err());

        let bad_level = format!(
            "{}\n[monitoring]\nenabled = true\nlog_level = \"loud\"\n",
            MINIMAL
        );
        let config = TomlConfig::from_toml_str(&bad_level).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[benchmark\nname=").unwrap_err();
        assert!(matches!(err, BeventError::ConfigValidationError { .. }));
    }
}
