use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token signing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Rate limited by {service}: {message}")]
    RateLimited { service: String, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Sheet is missing required column: {column}")]
    Schema { column: String },

    #[error("Row store error: {0}")]
    Store(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn parse(message: impl Into<String>) -> Self {
        AppError::Parse {
            message: message.into(),
        }
    }

    /// Errors worth another attempt: network failures, throttling,
    /// upstream 5xx and pages that came back malformed.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Http(_) => true,
            AppError::RateLimited { .. } => true,
            AppError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            AppError::Parse { .. } => true,
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            AppError::RateLimited { .. } | AppError::HttpStatus { status: 429, .. }
        )
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
