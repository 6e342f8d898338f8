//! Platform speech engine seam.

use scriptcast_models::VoiceDescriptor;

use crate::error::SpeechResult;

/// Identifier assigned by the controller to each utterance.
pub type UtteranceId = u64;

/// Text queued on the engine together with the voice to speak it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    /// `None` lets the engine pick its own default
    pub voice: Option<VoiceDescriptor>,
}

/// Notification raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started(UtteranceId),
    Ended(UtteranceId),
    Errored { id: UtteranceId, message: String },
    /// The platform voice registry changed
    VoicesChanged,
}

/// A process-wide speech synthesizer.
///
/// Only one utterance is active at a time. Events are queued by the engine
/// and drained with [`poll_events`](SpeechEngine::poll_events).
#[cfg_attr(test, mockall::automock)]
pub trait SpeechEngine: Send {
    /// Current voice registry snapshot. May be empty while the platform loads.
    fn voices(&self) -> Vec<VoiceDescriptor>;

    /// Begin speaking, replacing anything already queued.
    fn speak(&mut self, utterance: &Utterance) -> SpeechResult<()>;

    fn pause(&mut self);

    fn resume(&mut self);

    /// Drop the active utterance immediately.
    fn cancel(&mut self);

    /// Whether an utterance is queued (paused counts as speaking).
    fn is_speaking(&self) -> bool;

    /// Drain pending events in the order they occurred.
    fn poll_events(&mut self) -> Vec<SpeechEvent>;
}
