use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes raised across the workspace. Kept as plain strings so they
/// survive serialization unchanged.
pub mod codes {
    pub const TEXT_INVALID_INPUT: &str = "TEXT_INVALID_INPUT";
    pub const INPUT_READ_FAILED: &str = "INPUT_READ_FAILED";
    pub const OUTPUT_ENCODE_FAILED: &str = "OUTPUT_ENCODE_FAILED";
    pub const EXCHANGE_EXPORT_FAILED: &str = "EXCHANGE_EXPORT_FAILED";
    pub const EXCHANGE_LOAD_FAILED: &str = "EXCHANGE_LOAD_FAILED";
    pub const EXCHANGE_LOG_INVALID: &str = "EXCHANGE_LOG_INVALID";
    pub const AI_BACKEND_CONFIG_INVALID: &str = "AI_BACKEND_CONFIG_INVALID";
    pub const AI_BACKEND_FAILED: &str = "AI_BACKEND_FAILED";
    pub const AI_BACKEND_NOT_CONFIGURED: &str = "AI_BACKEND_NOT_CONFIGURED";
}

/// Single structured error shape shared by the library crates and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is_invalid_input(&self) -> bool {
        self.code == codes::TEXT_INVALID_INPUT
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
