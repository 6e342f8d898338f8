//! Play/pause/stop state machine over a speech engine.
//!
//! | From            | Trigger          | To       |
//! |-----------------|------------------|----------|
//! | Idle            | `play()`         | Speaking |
//! | Paused          | `play()`         | Speaking |
//! | Speaking        | `pause()`        | Paused   |
//! | Speaking/Paused | `stop()`         | Idle     |
//! | Speaking/Paused | end/error event  | Idle     |
//!
//! Engine failures never escape: they drop the controller back to `Idle`
//! and are kept in [`SpeechPlaybackController::last_error`].

use std::collections::HashSet;

use scriptcast_models::{PlaybackState, VoiceDescriptor};
use tracing::{debug, info, warn};

use crate::engine::{SpeechEngine, SpeechEvent, Utterance, UtteranceId};
use crate::error::{SpeechError, SpeechResult};

/// Language family offered by default.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Drives a [`SpeechEngine`] for a single script.
///
/// The controller owns the engine outright, so at most one of its
/// utterances is ever active.
pub struct SpeechPlaybackController<E: SpeechEngine> {
    engine: E,
    script: String,
    disabled: bool,
    state: PlaybackState,
    language: String,
    voices: Vec<VoiceDescriptor>,
    selected_voice: Option<String>,
    utterance: Option<Utterance>,
    next_utterance_id: UtteranceId,
    last_error: Option<SpeechError>,
}

impl<E: SpeechEngine> SpeechPlaybackController<E> {
    /// Create a controller offering English voices.
    pub fn new(engine: E) -> Self {
        Self::with_language(engine, DEFAULT_LANGUAGE)
    }

    /// Create a controller offering voices of the given language family.
    pub fn with_language(engine: E, language: impl Into<String>) -> Self {
        let mut controller = Self {
            engine,
            script: String::new(),
            disabled: false,
            state: PlaybackState::Idle,
            language: language.into(),
            voices: Vec::new(),
            selected_voice: None,
            utterance: None,
            next_utterance_id: 0,
            last_error: None,
        };
        controller.refresh_voices();
        controller
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Filtered, deduplicated voices in registry order.
    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn selected_voice(&self) -> Option<&VoiceDescriptor> {
        let uri = self.selected_voice.as_deref()?;
        self.voices.iter().find(|v| v.uri == uri)
    }

    /// Most recent engine failure, cleared by the next successful `play()`.
    pub fn last_error(&self) -> Option<&SpeechError> {
        self.last_error.as_ref()
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Replace the script. An utterance already in flight keeps its text.
    pub fn set_script(&mut self, script: impl Into<String>) {
        self.script = script.into();
    }

    /// Block `play()` while the caller is busy elsewhere.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Start speaking the script, or resume it when paused.
    ///
    /// No-op when disabled, when the script is blank, or while already
    /// speaking.
    pub fn play(&mut self) -> PlaybackState {
        if self.disabled || self.script.trim().is_empty() {
            return self.state;
        }

        match self.state {
            PlaybackState::Idle => self.start_utterance(),
            PlaybackState::Paused => {
                self.engine.resume();
                self.state = PlaybackState::Speaking;
            }
            PlaybackState::Speaking => {}
        }

        self.state
    }

    pub fn pause(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Speaking {
            self.engine.pause();
            self.state = PlaybackState::Paused;
        }
        self.state
    }

    /// Cancel playback. Always leaves the controller `Idle`.
    pub fn stop(&mut self) -> PlaybackState {
        if self.state.is_active() {
            self.engine.cancel();
        }
        self.utterance = None;
        self.state = PlaybackState::Idle;
        self.state
    }

    /// Choose the voice for the next utterance.
    pub fn select_voice(&mut self, uri: &str) -> SpeechResult<()> {
        if self.state.is_active() {
            return Err(SpeechError::VoiceLocked);
        }
        if !self.voices.iter().any(|v| v.uri == uri) {
            return Err(SpeechError::UnknownVoice(uri.to_string()));
        }

        self.selected_voice = Some(uri.to_string());
        Ok(())
    }

    /// Reload voices from the engine registry.
    ///
    /// An empty snapshot is ignored. The current selection survives when it
    /// is still offered; otherwise the registry default (or first voice) is
    /// chosen.
    pub fn refresh_voices(&mut self) {
        let available = self.engine.voices();
        if available.is_empty() {
            debug!("Voice registry is empty, keeping {} voices", self.voices.len());
            return;
        }

        let mut seen = HashSet::new();
        self.voices = available
            .into_iter()
            .filter(|v| v.speaks(&self.language))
            .filter(|v| seen.insert(v.uri.clone()))
            .collect();

        let still_offered = self
            .selected_voice
            .as_deref()
            .is_some_and(|uri| self.voices.iter().any(|v| v.uri == uri));

        if !still_offered {
            self.selected_voice = self
                .voices
                .iter()
                .find(|v| v.is_default)
                .or_else(|| self.voices.first())
                .map(|v| v.uri.clone());
        }

        debug!(
            voices = self.voices.len(),
            selected = ?self.selected_voice,
            "Refreshed voice registry"
        );
    }

    /// Apply one engine event.
    pub fn handle_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::VoicesChanged => self.refresh_voices(),
            SpeechEvent::Started(id) if self.is_current(id) => {
                debug!(utterance = id, "Speech started");
            }
            SpeechEvent::Ended(id) if self.is_current(id) => {
                info!(utterance = id, "Speech finished");
                self.utterance = None;
                self.state = PlaybackState::Idle;
            }
            SpeechEvent::Errored { id, message } if self.is_current(id) => {
                warn!(utterance = id, "Speech engine error: {}", message);
                self.last_error = Some(SpeechError::Engine(message));
                self.utterance = None;
                self.state = PlaybackState::Idle;
            }
            stale => debug!("Ignoring event for inactive utterance: {:?}", stale),
        }
    }

    /// Drain and apply all pending engine events.
    pub fn pump(&mut self) -> PlaybackState {
        for event in self.engine.poll_events() {
            self.handle_event(event);
        }
        self.state
    }

    fn is_current(&self, id: UtteranceId) -> bool {
        self.utterance.as_ref().is_some_and(|u| u.id == id)
    }

    fn start_utterance(&mut self) {
        self.next_utterance_id += 1;
        let utterance = Utterance {
            id: self.next_utterance_id,
            text: self.script.clone(),
            voice: self.selected_voice().cloned(),
        };

        match self.engine.speak(&utterance) {
            Ok(()) => {
                debug!(utterance = utterance.id, voice = ?self.selected_voice, "Speech queued");
                self.utterance = Some(utterance);
                self.state = PlaybackState::Speaking;
                self.last_error = None;
            }
            Err(e) => {
                warn!("Speech engine rejected utterance: {}", e);
                self.last_error = Some(e);
                self.utterance = None;
                self.state = PlaybackState::Idle;
            }
        }
    }
}

impl<E: SpeechEngine> Drop for SpeechPlaybackController<E> {
    fn drop(&mut self) {
        if self.state.is_active() || self.engine.is_speaking() {
            self.engine.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockSpeechEngine;

    fn voice(uri: &str, lang: &str) -> VoiceDescriptor {
        VoiceDescriptor::new(uri, uri.to_uppercase(), lang)
    }

    /// Engine with a fixed registry that reports idle on teardown.
    fn engine_with(voices: Vec<VoiceDescriptor>) -> MockSpeechEngine {
        let mut engine = MockSpeechEngine::new();
        engine.expect_voices().returning(move || voices.clone());
        engine.expect_is_speaking().return_const(false);
        engine
    }

    fn english_voices() -> Vec<VoiceDescriptor> {
        vec![
            voice("fr-1", "fr-FR"),
            voice("en-1", "en-US"),
            voice("en-2", "en-GB").as_default(),
            voice("en-1", "en-US"),
        ]
    }

    #[test]
    fn test_voices_filtered_and_deduplicated() {
        let controller = SpeechPlaybackController::new(engine_with(english_voices()));

        let uris: Vec<_> = controller.voices().iter().map(|v| v.uri.as_str()).collect();
        assert_eq!(uris, vec!["en-1", "en-2"]);
        assert_eq!(controller.selected_voice().unwrap().uri, "en-2");
    }

    #[test]
    fn test_default_falls_back_to_first_voice() {
        let controller = SpeechPlaybackController::new(engine_with(vec![
            voice("en-a", "en-AU"),
            voice("en-b", "en-US"),
        ]));
        assert_eq!(controller.selected_voice().unwrap().uri, "en-a");
    }

    #[test]
    fn test_refresh_is_idempotent_and_keeps_selection() {
        let mut controller = SpeechPlaybackController::new(engine_with(english_voices()));
        controller.select_voice("en-1").unwrap();

        for _ in 0..3 {
            controller.handle_event(SpeechEvent::VoicesChanged);
            assert_eq!(controller.selected_voice().unwrap().uri, "en-1");
        }
    }

    #[test]
    fn test_refresh_redefaults_when_selection_disappears() {
        let mut engine = MockSpeechEngine::new();
        let mut seq = mockall::Sequence::new();
        engine
            .expect_voices()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| vec![voice("en-1", "en-US"), voice("en-2", "en-GB")]);
        engine
            .expect_voices()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| vec![voice("en-3", "en-US").as_default(), voice("en-1", "en-US")]);
        engine
            .expect_voices()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| vec![voice("en-3", "en-US").as_default()]);
        engine.expect_is_speaking().return_const(false);

        let mut controller = SpeechPlaybackController::new(engine);
        controller.select_voice("en-1").unwrap();

        controller.refresh_voices();
        assert_eq!(controller.selected_voice().unwrap().uri, "en-1");

        controller.refresh_voices();
        assert_eq!(controller.selected_voice().unwrap().uri, "en-3");
    }

    #[test]
    fn test_empty_registry_keeps_voices() {
        let mut engine = MockSpeechEngine::new();
        let mut seq = mockall::Sequence::new();
        engine
            .expect_voices()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| vec![voice("en-1", "en-US")]);
        engine
            .expect_voices()
            .times(1)
            .in_sequence(&mut seq)
            .returning(Vec::new);
        engine.expect_is_speaking().return_const(false);

        let mut controller = SpeechPlaybackController::new(engine);
        controller.refresh_voices();
        assert_eq!(controller.voices().len(), 1);
        assert_eq!(controller.selected_voice().unwrap().uri, "en-1");
    }

    #[test]
    fn test_play_on_blank_script_is_noop() {
        let mut engine = engine_with(english_voices());
        engine.expect_speak().never();

        let mut controller = SpeechPlaybackController::new(engine);
        assert_eq!(controller.play(), PlaybackState::Idle);

        controller.set_script("   \n\t");
        assert_eq!(controller.play(), PlaybackState::Idle);
    }

    #[test]
    fn test_play_when_disabled_is_noop() {
        let mut engine = engine_with(english_voices());
        engine.expect_speak().never();

        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");
        controller.set_disabled(true);
        assert_eq!(controller.play(), PlaybackState::Idle);
    }

    #[test]
    fn test_play_twice_speaks_once() {
        let mut engine = engine_with(english_voices());
        engine
            .expect_speak()
            .withf(|u| u.text == "Hello there" && u.voice.as_ref().map(|v| v.uri.as_str()) == Some("en-2"))
            .times(1)
            .returning(|_| Ok(()));
        engine.expect_cancel().times(1).return_const(());

        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");

        assert_eq!(controller.play(), PlaybackState::Speaking);
        assert_eq!(controller.play(), PlaybackState::Speaking);
        // dropped while speaking: cancelled on teardown
    }

    #[test]
    fn test_pause_resume_stop() {
        let mut engine = engine_with(english_voices());
        engine.expect_speak().times(1).returning(|_| Ok(()));
        engine.expect_pause().times(1).return_const(());
        engine.expect_resume().times(1).return_const(());
        engine.expect_cancel().times(1).return_const(());

        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");

        controller.play();
        assert_eq!(controller.pause(), PlaybackState::Paused);
        assert_eq!(controller.play(), PlaybackState::Speaking);
        assert_eq!(controller.stop(), PlaybackState::Idle);
    }

    #[test]
    fn test_stop_from_paused_and_idle() {
        let mut engine = engine_with(english_voices());
        engine.expect_speak().times(1).returning(|_| Ok(()));
        engine.expect_pause().times(1).return_const(());
        engine.expect_cancel().times(1).return_const(());

        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");

        controller.play();
        controller.pause();
        assert_eq!(controller.stop(), PlaybackState::Idle);
        assert_eq!(controller.stop(), PlaybackState::Idle);
    }

    #[test]
    fn test_end_event_returns_to_idle_and_allows_new_utterance() {
        let mut engine = engine_with(english_voices());
        let mut seq = mockall::Sequence::new();
        engine
            .expect_speak()
            .withf(|u| u.id == 1)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        engine
            .expect_poll_events()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| vec![SpeechEvent::Started(1), SpeechEvent::Ended(1)]);
        engine
            .expect_speak()
            .withf(|u| u.id == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        engine.expect_cancel().times(1).return_const(());

        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");

        controller.play();
        assert_eq!(controller.pump(), PlaybackState::Idle);
        assert_eq!(controller.play(), PlaybackState::Speaking);
    }

    #[test]
    fn test_error_event_resets_to_idle() {
        let mut engine = engine_with(english_voices());
        engine.expect_speak().times(1).returning(|_| Ok(()));

        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");
        controller.play();

        controller.handle_event(SpeechEvent::Errored {
            id: 1,
            message: "synthesis-failed".into(),
        });

        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(matches!(controller.last_error(), Some(SpeechError::Engine(m)) if m == "synthesis-failed"));
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let mut engine = engine_with(english_voices());
        engine.expect_speak().times(2).returning(|_| Ok(()));
        engine.expect_cancel().times(2).return_const(());

        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");

        controller.play();
        controller.stop();
        controller.play();

        // late events from the cancelled first utterance
        controller.handle_event(SpeechEvent::Errored {
            id: 1,
            message: "interrupted".into(),
        });
        controller.handle_event(SpeechEvent::Ended(1));
        assert_eq!(controller.state(), PlaybackState::Speaking);
        assert!(controller.last_error().is_none());
    }

    #[test]
    fn test_speak_failure_stays_idle() {
        let mut engine = engine_with(english_voices());
        engine
            .expect_speak()
            .times(1)
            .returning(|_| Err(SpeechError::engine("audio device busy")));

        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");

        assert_eq!(controller.play(), PlaybackState::Idle);
        assert!(controller.last_error().is_some());
    }

    #[test]
    fn test_select_voice_rules() {
        let mut engine = engine_with(english_voices());
        engine.expect_speak().times(1).returning(|_| Ok(()));
        engine.expect_cancel().times(1).return_const(());

        let mut controller = SpeechPlaybackController::new(engine);
        assert!(matches!(
            controller.select_voice("fr-1"),
            Err(SpeechError::UnknownVoice(_))
        ));

        controller.set_script("Hello there");
        controller.play();
        assert!(matches!(
            controller.select_voice("en-1"),
            Err(SpeechError::VoiceLocked)
        ));

        controller.stop();
        assert!(controller.select_voice("en-1").is_ok());
    }

    #[test]
    fn test_drop_cancels_engine_that_is_still_speaking() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_voices().returning(Vec::new);
        engine.expect_is_speaking().return_const(true);
        engine.expect_cancel().times(1).return_const(());

        let controller = SpeechPlaybackController::new(engine);
        drop(controller);
    }
}
