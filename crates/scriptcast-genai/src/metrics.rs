//! Metrics for remote generation calls.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! binary installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const METADATA_REQUESTS_TOTAL: &str = "scriptcast_metadata_requests_total";
    pub const VIDEO_JOBS_TOTAL: &str = "scriptcast_video_jobs_total";
    pub const VIDEO_JOB_DURATION_SECONDS: &str = "scriptcast_video_job_duration_seconds";
    pub const VIDEO_POLLS_TOTAL: &str = "scriptcast_video_polls_total";
    pub const VIDEO_DOWNLOAD_BYTES_TOTAL: &str = "scriptcast_video_download_bytes_total";
}

/// Record a metadata request outcome (`ok` or an error kind).
pub fn record_metadata_request(model: &str, outcome: &str) {
    let labels = [
        ("model", model.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::METADATA_REQUESTS_TOTAL, &labels).increment(1);
}

/// Record one poll of a video job.
pub fn record_video_poll(model: &str) {
    let labels = [("model", model.to_string())];
    counter!(names::VIDEO_POLLS_TOTAL, &labels).increment(1);
}

/// Record a finished video generation run.
pub fn record_video_job(model: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("model", model.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::VIDEO_JOBS_TOTAL, &labels).increment(1);
    histogram!(names::VIDEO_JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record downloaded asset bytes.
pub fn record_download_bytes(bytes: u64) {
    counter!(names::VIDEO_DOWNLOAD_BYTES_TOTAL).increment(bytes);
}
