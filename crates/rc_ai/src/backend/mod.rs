use rc_core::error::{codes, AppError};
use thiserror::Error;

pub mod openai;

/// A remote completion service.
///
/// Implementations make exactly one attempt per call; retry and fallback
/// policy belongs to the caller.
pub trait RemoteBackend: Send + Sync {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, BackendError>;
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("backend returned an empty completion")]
    EmptyResponse,
}

impl BackendError {
    /// Network failures, throttling and server-side errors may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(_) => true,
            BackendError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        let retryable = e.is_retryable();
        let details = match &e {
            BackendError::Status { status, body } => format!("status={status}; body={body}"),
            other => other.to_string(),
        };
        AppError::new(codes::AI_BACKEND_FAILED, "Remote backend call failed")
            .with_details(details)
            .with_retryable(retryable)
    }
}
