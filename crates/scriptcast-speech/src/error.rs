//! Speech error types.

use thiserror::Error;

pub type SpeechResult<T> = Result<T, SpeechError>;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech engine error: {0}")]
    Engine(String),

    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    #[error("Voice cannot change during playback")]
    VoiceLocked,

    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
}
