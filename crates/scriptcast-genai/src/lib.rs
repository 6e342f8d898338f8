//! Generative AI client for ScriptCast.
//!
//! This crate provides:
//! - Metadata generation (title, keywords, description) from a script
//! - Long-running video generation with status narration
//! - Locally materialized video assets
//! - Environment-sourced configuration

pub mod asset;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod metrics;
pub mod video;

pub use asset::VideoAssetHandle;
pub use client::GeminiClient;
pub use config::GenAiConfig;
pub use error::{GenAiError, GenAiResult};
pub use logging::VideoJobLogger;
pub use metadata::MetadataGenerator;
pub use video::{Sleeper, TokioSleeper, VideoJobPoller, FINALIZING_MESSAGE, STATUS_MESSAGES};
