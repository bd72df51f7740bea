use thiserror::Error;

/// Batch-level failures. These abort the run before or after row processing,
/// never because of a single row.
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Input table error: {message}")]
    InputError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Output,
    Network,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::MissingConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EnrichError::CsvError(_) | EnrichError::InputError { .. } => ErrorCategory::Input,
            EnrichError::IoError(_) => ErrorCategory::Output,
            EnrichError::HttpClientError(_) => ErrorCategory::Network,
            EnrichError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Output | ErrorCategory::Processing => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EnrichError::MissingConfigError { field } if field == "api_key" => {
                "Set OPENAI_API_KEY or add api_key under [source] in the config file"
            }
            EnrichError::MissingConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::ConfigValidationError { .. } => "Check the command-line flags and the TOML config file",
            EnrichError::CsvError(_) | EnrichError::InputError { .. } => {
                "Make sure the input CSV has the columns: location, company_name, website, phone, email, description"
            }
            EnrichError::IoError(_) => "Check that the input file exists and the output directory is writable",
            EnrichError::HttpClientError(_) => "Check network connectivity and TLS settings",
            EnrichError::ProcessingError { .. } => "Re-run with --verbose and inspect the logs",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Input => format!("Could not read the input table: {}", self),
            ErrorCategory::Output => format!("File access failed: {}", self),
            ErrorCategory::Network => format!("Could not set up the service client: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_high_severity_config_error() {
        let err = EnrichError::MissingConfigError {
            field: "api_key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err = EnrichError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert_eq!(err.category(), ErrorCategory::Output);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("read-only"));
    }

    #[test]
    fn test_config_and_processing_severity() {
        let toml_err = EnrichError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: "bad".to_string(),
        };
        let processing = EnrichError::ProcessingError {
            message: "csv writer".to_string(),
        };

        assert_eq!(toml_err.severity(), ErrorSeverity::High);
        assert_eq!(processing.category(), ErrorCategory::Processing);
        assert_eq!(processing.severity(), ErrorSeverity::Critical);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
    }
}
