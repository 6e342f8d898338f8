//! Shared data models for ScriptCast.
//!
//! This crate provides Serde-serializable types for:
//! - Generated YouTube metadata
//! - Long-running video job snapshots
//! - Synthetic voice descriptors
//! - Speech playback state

pub mod metadata;
pub mod playback;
pub mod video_job;
pub mod voice;

// Re-export common types
pub use metadata::{GeneratedMetadata, MetadataAdvisory};
pub use playback::PlaybackState;
pub use video_job::{JobErrorStatus, VideoJob, VideoJobPhase};
pub use voice::VoiceDescriptor;
