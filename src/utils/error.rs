use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

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

    #[error("Geocoding failed: {message}")]
    GeocodingError { message: String },

    #[error("Device location unavailable: {message}")]
    LocationError { message: String },

    #[error("Local memory error: {message}")]
    MemoryError { message: String },

    #[error("Lead store error: {message}")]
    StoreError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LeadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LeadError::ApiError(_) | LeadError::GeocodingError { .. } => ErrorCategory::Network,
            LeadError::ConfigError { .. }
            | LeadError::MissingConfigError { .. }
            | LeadError::InvalidConfigValueError { .. }
            | LeadError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            LeadError::IoError(_) | LeadError::MemoryError { .. } | LeadError::StoreError { .. } => {
                ErrorCategory::Storage
            }
            LeadError::SerializationError(_) | LeadError::LocationError { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 位置與本機記憶失敗都不會阻擋送出
            LeadError::GeocodingError { .. }
            | LeadError::LocationError { .. }
            | LeadError::MemoryError { .. } => ErrorSeverity::Low,
            LeadError::ApiError(_) | LeadError::StoreError { .. } => ErrorSeverity::Medium,
            LeadError::SerializationError(_) | LeadError::IoError(_) => ErrorSeverity::High,
            LeadError::ConfigError { .. }
            | LeadError::MissingConfigError { .. }
            | LeadError::InvalidConfigValueError { .. }
            | LeadError::ConfigValidationError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LeadError::ApiError(_) => "Could not reach a remote service.".to_string(),
            LeadError::IoError(e) => format!("File access failed: {}", e),
            LeadError::SerializationError(_) => "Received malformed data.".to_string(),
            LeadError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required.", field)
            }
            LeadError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            LeadError::ConfigError { message } => format!("Configuration problem: {}", message),
            LeadError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            LeadError::GeocodingError { .. } => "The address could not be located.".to_string(),
            LeadError::LocationError { .. } => "Device location is not available.".to_string(),
            LeadError::MemoryError { .. } => "Local memory is not available.".to_string(),
            LeadError::StoreError { message } => format!("Saving failed: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the network connection and the service endpoints.",
            ErrorCategory::Configuration => "Fix the configuration file and run again.",
            ErrorCategory::Storage => "Check file permissions and the store settings.",
            ErrorCategory::Data => "Check the input values and try again.",
        }
    }
}

pub type Result<T> = std::result::Result<T, LeadError>;
