//! Generative client error types.

use std::time::Duration;

use thiserror::Error;

pub type GenAiResult<T> = Result<T, GenAiError>;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Script is empty")]
    EmptyScript,

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, raw: String },

    #[error("Video job completed without a result")]
    JobIncomplete,

    #[error("Video job failed ({code}): {message}")]
    JobFailed { code: i32, message: String },

    #[error("Video download failed with status {status}")]
    Download { status: u16 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Video job still running after {waited:?}")]
    Timeout { waited: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GenAiError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs carry the API key; keep it out of error messages.
        GenAiError::RemoteService(e.without_url().to_string())
    }
}

impl GenAiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteService(msg.into())
    }

    pub fn malformed(msg: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: msg.into(),
            raw: raw.into(),
        }
    }

    /// Raw payload captured for diagnostics, if any.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            GenAiError::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Check if the error came from the remote service (network, status, payload).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            GenAiError::RemoteService(_)
                | GenAiError::MalformedResponse { .. }
                | GenAiError::JobIncomplete
                | GenAiError::JobFailed { .. }
                | GenAiError::Download { .. }
        )
    }

    /// Whether the message is meaningful to an end user as-is. Remote
    /// failures are reported generically and logged in detail instead.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            GenAiError::Config(_) | GenAiError::EmptyScript | GenAiError::Cancelled | GenAiError::Timeout { .. }
        )
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenAiError::Config(_) => "configuration",
            GenAiError::EmptyScript => "empty_script",
            GenAiError::RemoteService(_) => "remote_service",
            GenAiError::MalformedResponse { .. } => "malformed_response",
            GenAiError::JobIncomplete => "job_incomplete",
            GenAiError::JobFailed { .. } => "job_failed",
            GenAiError::Download { .. } => "download",
            GenAiError::Cancelled => "cancelled",
            GenAiError::Timeout { .. } => "timeout",
            GenAiError::Io(_) => "io",
        }
    }
}
