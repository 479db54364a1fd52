use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Item conversion error: {0}")]
    ItemConversionError(#[from] serde_dynamo::Error),

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("Password hash error: {0}")]
    PasswordHashError(#[from] bcrypt::BcryptError),

    #[error("DynamoDB {operation} failed: {message}")]
    DatabaseError {
        operation: &'static str,
        message: String,
    },

    #[error("S3 {operation} failed: {message}")]
    StorageError {
        operation: &'static str,
        message: String,
    },

    #[error("Notification error: {message}")]
    NotificationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },
}

impl CatalogueError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn database(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::DatabaseError {
            operation,
            message: err.to_string(),
        }
    }

    pub fn storage(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::StorageError {
            operation,
            message: err.to_string(),
        }
    }

    /// Whether the failure was caused by the caller rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ValidationError { .. }
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::Unauthorized { .. }
                | Self::Forbidden { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogueError>;
