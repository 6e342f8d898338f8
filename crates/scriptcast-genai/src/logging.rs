//! Structured logging for video jobs.
//!
//! Every line carries the job handle and model so a single run can be
//! followed through submission, polling and download.

use scriptcast_models::VideoJobPhase;
use tracing::{info, warn, Span};

/// Per-run logger for a video generation job.
#[derive(Debug, Clone)]
pub struct VideoJobLogger {
    job: String,
    model: String,
}

impl VideoJobLogger {
    /// Create a logger before the server has assigned a handle.
    pub fn new(model: &str) -> Self {
        Self {
            job: "<unsubmitted>".to_string(),
            model: model.to_string(),
        }
    }

    /// Attach the server-assigned job handle.
    pub fn set_job(&mut self, job: &str) {
        self.job = job.to_string();
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Log a phase change.
    pub fn log_phase(&self, phase: VideoJobPhase, message: &str) {
        info!(
            job = %self.job,
            model = %self.model,
            phase = %phase,
            "{}", message
        );
    }

    /// Log one poll round trip.
    pub fn log_poll(&self, attempt: u32, done: bool) {
        info!(
            job = %self.job,
            model = %self.model,
            attempt,
            done,
            "Polled video job"
        );
    }

    /// Log a terminal failure.
    pub fn log_failure(&self, phase: VideoJobPhase, error: &dyn std::fmt::Display) {
        warn!(
            job = %self.job,
            model = %self.model,
            phase = %phase,
            "Video job failed: {}", error
        );
    }

    /// Span wrapping the whole run.
    pub fn span(&self) -> Span {
        tracing::info_span!("video_job", model = %self.model)
    }
}
