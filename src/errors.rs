use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid video file: {path}: {reason}")]
    InvalidFile { path: String, reason: String },

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after_ms}ms")]
    RateLimit { retry_after_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload log write failed for '{title}' (video {video_id}): {source}")]
    LogWrite {
        title: String,
        video_id: String,
        source: std::io::Error,
    },
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn file_not_found(path: &str) -> Self {
        Self::FileNotFound {
            path: path.to_string(),
        }
    }

    pub fn invalid_file(path: &str, reason: &str) -> Self {
        Self::InvalidFile {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn upload_failed(reason: impl Into<String>) -> Self {
        Self::UploadFailed {
            reason: reason.into(),
        }
    }

    /// Errors worth another pass through the queue.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::RateLimit { .. } | AppError::UploadFailed { .. }
        )
    }

    /// Errors that will never succeed no matter how often the file is retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AppError::Auth(_)
                | AppError::Config(_)
                | AppError::FileNotFound { .. }
                | AppError::InvalidFile { .. }
        )
    }
}
