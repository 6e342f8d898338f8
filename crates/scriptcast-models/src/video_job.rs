//! Snapshots of long-running video generation jobs.
//!
//! The remote service owns the job; these types only mirror the last
//! snapshot fetched from it. A fresh snapshot replaces the previous one
//! wholesale on every poll.

use serde::{Deserialize, Serialize};

/// Snapshot of a remote video generation operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoJob {
    /// Opaque operation handle used for the next poll; poll replies may omit it
    #[serde(default)]
    pub name: String,
    /// Set once the server has finished the job (successfully or not)
    #[serde(default)]
    pub done: bool,
    /// Result payload, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<VideoJobResponse>,
    /// Server-side failure, present when the job finished with an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobErrorStatus>,
}

/// Result payload of a completed job.
///
/// The service has shipped two shapes for the same data; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoJobResponse {
    #[serde(rename = "generatedVideos", default, skip_serializing_if = "Vec::is_empty")]
    pub generated_videos: Vec<GeneratedVideo>,
    #[serde(
        rename = "generateVideoResponse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub generate_video_response: Option<GeneratedSamples>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSamples {
    #[serde(rename = "generatedSamples", default)]
    pub generated_samples: Vec<GeneratedVideo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Error object attached to a failed operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobErrorStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl VideoJob {
    /// Create a pending snapshot for the given handle.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Download URI of the first generated video, if the job produced one.
    pub fn first_video_uri(&self) -> Option<&str> {
        let response = self.response.as_ref()?;
        let video = response.generated_videos.first().or_else(|| {
            response
                .generate_video_response
                .as_ref()
                .and_then(|r| r.generated_samples.first())
        })?;

        video
            .video
            .as_ref()
            .and_then(|v| v.uri.as_deref())
            .filter(|uri| !uri.trim().is_empty())
    }

    /// Whether the job has finished.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// Phase of a local video generation run, used for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoJobPhase {
    /// Job submission in flight
    #[default]
    Submitting,
    /// Waiting for the server to finish
    Polling,
    /// Server reported completion, extracting the result
    Finalizing,
    /// Fetching the binary asset
    Downloading,
    /// Asset materialized locally
    Ready,
}

impl VideoJobPhase {
    /// Get string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoJobPhase::Submitting => "submitting",
            VideoJobPhase::Polling => "polling",
            VideoJobPhase::Finalizing => "finalizing",
            VideoJobPhase::Downloading => "downloading",
            VideoJobPhase::Ready => "ready",
        }
    }

    /// Check if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoJobPhase::Ready)
    }
}

impl std::fmt::Display for VideoJobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_snapshot() {
        let job: VideoJob = serde_json::from_str(r#"{"name":"operations/abc"}"#).unwrap();
        assert_eq!(job, VideoJob::pending("operations/abc"));
        assert!(!job.is_done());
        assert_eq!(job.first_video_uri(), None);
    }

    #[test]
    fn test_snapshot_without_handle() {
        let job: VideoJob = serde_json::from_str(r#"{"done":false}"#).unwrap();
        assert!(job.name.is_empty());
        assert!(!job.is_done());
    }

    #[test]
    fn test_generated_videos_shape() {
        let json = r#"{
            "name": "operations/abc",
            "done": true,
            "response": {"generatedVideos": [{"video": {"uri": "https://x/v1"}}, {"video": {"uri": "https://x/v2"}}]}
        }"#;
        let job: VideoJob = serde_json::from_str(json).unwrap();
        assert!(job.is_done());
        assert_eq!(job.first_video_uri(), Some("https://x/v1"));
    }

    #[test]
    fn test_generated_samples_shape() {
        let json = r#"{
            "name": "operations/abc",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [{"video": {"uri": "https://x/s1"}}]}}
        }"#;
        let job: VideoJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.first_video_uri(), Some("https://x/s1"));
    }

    #[test]
    fn test_done_without_uri() {
        let json = r#"{"name":"operations/abc","done":true,"response":{"generatedVideos":[{"video":{}}]}}"#;
        let job: VideoJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.first_video_uri(), None);

        let blank = r#"{"name":"operations/abc","done":true,"response":{"generatedVideos":[{"video":{"uri":"  "}}]}}"#;
        let job: VideoJob = serde_json::from_str(blank).unwrap();
        assert_eq!(job.first_video_uri(), None);
    }

    #[test]
    fn test_error_object() {
        let json = r#"{"name":"operations/abc","done":true,"error":{"code":3,"message":"prompt rejected"}}"#;
        let job: VideoJob = serde_json::from_str(json).unwrap();
        let err = job.error.unwrap();
        assert_eq!(err.code, 3);
        assert_eq!(err.message, "prompt rejected");
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(VideoJobPhase::Polling.to_string(), "polling");
        assert!(VideoJobPhase::Ready.is_terminal());
        assert!(!VideoJobPhase::Downloading.is_terminal());
    }
}
