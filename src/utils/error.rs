use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeventError {
    #[error("{role} at index {index} has no retrievable `{field}` identifier")]
    MissingIdentifier {
        role: RecordRole,
        index: usize,
        field: String,
    },

    #[error("Notification to {recipient} could not be delivered: {reason}")]
    DeliveryError { recipient: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in `{field}`: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value `{value}` for `{field}`: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration `{field}`")]
    MissingConfigError { field: String },

    #[error("Optimized and naive filters disagree: {message}")]
    ParityError { message: String },

    #[error("Benchmark failed: {message}")]
    BenchmarkError { message: String },
}

/// Which side of the filter a malformed element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRole {
    Supplier,
    Service,
}

impl std::fmt::Display for RecordRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordRole::Supplier => write!(f, "supplier"),
            RecordRole::Service => write!(f, "service"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Delivery,
    Io,
    Configuration,
    Benchmark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BeventError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BeventError::MissingIdentifier { .. } | BeventError::SerializationError(_) => {
                ErrorCategory::Data
            }
            BeventError::DeliveryError { .. } => ErrorCategory::Delivery,
            BeventError::IoError(_) | BeventError::CsvError(_) => ErrorCategory::Io,
            BeventError::ConfigValidationError { .. }
            | BeventError::InvalidConfigValueError { .. }
            | BeventError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BeventError::ParityError { .. } | BeventError::BenchmarkError { .. } => {
                ErrorCategory::Benchmark
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BeventError::DeliveryError { .. } => ErrorSeverity::Medium,
            BeventError::MissingIdentifier { .. }
            | BeventError::SerializationError(_)
            | BeventError::ConfigValidationError { .. }
            | BeventError::InvalidConfigValueError { .. }
            | BeventError::MissingConfigError { .. }
            | BeventError::BenchmarkError { .. } => ErrorSeverity::High,
            BeventError::IoError(_)
            | BeventError::CsvError(_)
            | BeventError::ParityError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BeventError::MissingIdentifier { field, .. } => format!(
                "Make sure every record carries a string, integer or ObjectId `{}` field",
                field
            ),
            BeventError::DeliveryError { .. } => {
                "Check the mail transport configuration and retry the notification".to_string()
            }
            BeventError::IoError(_) => {
                "Check that the output path exists and is writable".to_string()
            }
            BeventError::CsvError(_) => {
                "Check the report destination for a corrupted file".to_string()
            }
            BeventError::SerializationError(_) => {
                "Check the report for values JSON cannot represent".to_string()
            }
            BeventError::ConfigValidationError { field, .. }
            | BeventError::InvalidConfigValueError { field, .. }
            | BeventError::MissingConfigError { field } => {
                format!("Fix the `{}` setting in the configuration", field)
            }
            BeventError::ParityError { .. } => {
                "The optimized filter changed observable behavior; do not trust its numbers"
                    .to_string()
            }
            BeventError::BenchmarkError { .. } => {
                "Re-run with --verbose to see which phase failed".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Data => format!("Input data problem: {}", self),
            ErrorCategory::Delivery => format!("Notification problem: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Benchmark => format!("Benchmark problem: {}", self),
        }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BeventError>;
