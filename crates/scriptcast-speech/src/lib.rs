//! Speech playback for ScriptCast voiceover previews.
//!
//! This crate provides:
//! - The `SpeechEngine` seam over a platform speech synthesizer
//! - A play/pause/stop state machine with voice selection
//! - A process-backed engine driving `espeak-ng`

pub mod command;
pub mod controller;
pub mod engine;
pub mod error;

pub use command::CommandEngine;
pub use controller::{SpeechPlaybackController, DEFAULT_LANGUAGE};
pub use engine::{SpeechEngine, SpeechEvent, Utterance, UtteranceId};
pub use error::{SpeechError, SpeechResult};
