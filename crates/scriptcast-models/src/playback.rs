//! Speech playback state.

use serde::{Deserialize, Serialize};

/// Playback state of the speech controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing queued on the engine
    #[default]
    Idle,
    /// An utterance is being spoken
    Speaking,
    /// The current utterance is paused and can be resumed
    Paused,
}

impl PlaybackState {
    /// Get string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Speaking => "speaking",
            PlaybackState::Paused => "paused",
        }
    }

    /// Whether the controller currently owns an utterance on the engine.
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Speaking | PlaybackState::Paused)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
