// Error types for the restaurant reviews client.
// Covers backend API failures, local store problems, and configuration errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Backend request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Restaurant does not exist: {0}")]
    RestaurantNotFound(u64),

    #[error("No pending offline review for restaurant {0}")]
    NoPendingReview(u64),

    #[error("Invalid review: {0}")]
    InvalidReview(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error means the backend could not be reached at all,
    /// as opposed to the backend answering with a failure.
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Unreachable(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
