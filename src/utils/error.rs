use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    #[error("Header row of table '{table}' is empty")]
    HeaderRegionEmpty { table: String },

    #[error("Timed out after {waited_ms}ms waiting for the lock on table '{table}'")]
    LockTimeout { table: String, waited_ms: u64 },

    #[error("Table store rejected the request ({status}): {message}")]
    StoreRejected { status: u16, message: String },

    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IngestError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            IngestError::MalformedRequest { .. } | IngestError::UnsupportedContentType { .. } => {
                ErrorSeverity::Low
            }
            IngestError::LockTimeout { .. } => ErrorSeverity::Medium,
            IngestError::ApiError(_) | IngestError::StoreRejected { .. } => ErrorSeverity::Medium,
            IngestError::TableNotFound { .. }
            | IngestError::HeaderRegionEmpty { .. }
            | IngestError::CsvError(_)
            | IngestError::SerializationError(_) => ErrorSeverity::High,
            IngestError::IoError(_)
            | IngestError::ConfigError { .. }
            | IngestError::InvalidConfigValueError { .. }
            | IngestError::MissingConfigError { .. }
            | IngestError::ConfigValidationError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            IngestError::ConfigError { .. }
                | IngestError::InvalidConfigValueError { .. }
                | IngestError::MissingConfigError { .. }
                | IngestError::ConfigValidationError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
