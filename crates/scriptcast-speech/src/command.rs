//! Speech engine backed by the `espeak-ng` command line synthesizer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use scriptcast_models::VoiceDescriptor;
use tracing::{debug, info, warn};

use crate::engine::{SpeechEngine, SpeechEvent, Utterance, UtteranceId};
use crate::error::{SpeechError, SpeechResult};

const PROGRAMS: &[&str] = &["espeak-ng", "espeak"];

/// Language tag of the synthesizer's own default voice.
const DEFAULT_VOICE_LANG: &str = "en";

/// Spawns one synthesizer process per utterance.
///
/// Pause and resume stop and continue the process, so they are only
/// supported on unix.
pub struct CommandEngine {
    program: PathBuf,
    child: Option<Child>,
    current: Option<UtteranceId>,
    events: Vec<SpeechEvent>,
}

impl CommandEngine {
    /// Locate `espeak-ng` (or `espeak`) on the PATH.
    pub fn detect() -> SpeechResult<Self> {
        let program = PROGRAMS
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| SpeechError::EngineUnavailable(format!("none of {} found on PATH", PROGRAMS.join(", "))))?;

        info!("Using speech synthesizer at {}", program.display());
        Ok(Self::with_program(program))
    }

    /// Use a specific synthesizer binary.
    pub fn with_program(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            child: None,
            current: None,
            events: Vec::new(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    #[cfg(unix)]
    fn signal(&self, signal: nix::sys::signal::Signal) {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let Some(child) = &self.child else {
            return;
        };

        if let Err(e) = kill(Pid::from_raw(child.id() as i32), signal) {
            warn!("Failed to send {:?} to synthesizer: {}", signal, e);
        }
    }
}

impl SpeechEngine for CommandEngine {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        match Command::new(&self.program).arg("--voices").stderr(Stdio::null()).output() {
            Ok(output) if output.status.success() => parse_voice_list(&String::from_utf8_lossy(&output.stdout)),
            Ok(output) => {
                warn!("Voice listing exited with {}", output.status);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to list voices: {}", e);
                Vec::new()
            }
        }
    }

    fn speak(&mut self, utterance: &Utterance) -> SpeechResult<()> {
        self.cancel();

        let mut command = Command::new(&self.program);
        if let Some(voice) = &utterance.voice {
            command.arg("-v").arg(&voice.uri);
        }
        let mut child = command
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let text = utterance.text.clone();
            // Closing stdin marks the end of the text
            std::thread::spawn(move || {
                if let Err(e) = stdin.write_all(text.as_bytes()) {
                    debug!("Synthesizer closed stdin early: {}", e);
                }
            });
        }

        debug!(utterance = utterance.id, pid = child.id(), "Synthesizer started");
        self.child = Some(child);
        self.current = Some(utterance.id);
        self.events.push(SpeechEvent::Started(utterance.id));
        Ok(())
    }

    fn pause(&mut self) {
        #[cfg(unix)]
        self.signal(nix::sys::signal::Signal::SIGSTOP);
        #[cfg(not(unix))]
        warn!("Pausing speech is not supported on this platform");
    }

    fn resume(&mut self) {
        #[cfg(unix)]
        self.signal(nix::sys::signal::Signal::SIGCONT);
        #[cfg(not(unix))]
        warn!("Resuming speech is not supported on this platform");
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = child.id(), "Killing synthesizer");
            let _ = child.kill();
            let _ = child.wait();
        }
        self.current = None;
    }

    fn is_speaking(&self) -> bool {
        self.child.is_some()
    }

    fn poll_events(&mut self) -> Vec<SpeechEvent> {
        if let (Some(child), Some(id)) = (self.child.as_mut(), self.current) {
            let finished = match child.try_wait() {
                Ok(Some(status)) if status.success() => Some(SpeechEvent::Ended(id)),
                Ok(Some(status)) => Some(SpeechEvent::Errored {
                    id,
                    message: format!("synthesizer exited with {}", status),
                }),
                Ok(None) => None,
                Err(e) => Some(SpeechEvent::Errored {
                    id,
                    message: e.to_string(),
                }),
            };

            if let Some(event) = finished {
                self.child = None;
                self.current = None;
                self.events.push(event);
            }
        }

        std::mem::take(&mut self.events)
    }
}

impl Drop for CommandEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Parse `--voices` output.
///
/// Columns are `Pty Language Age/Gender VoiceName File [Other Languages]`;
/// the language column doubles as the voice identifier.
pub fn parse_voice_list(output: &str) -> Vec<VoiceDescriptor> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let lang = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?.replace('_', " ");

            let voice = VoiceDescriptor::new(lang, name, lang);
            Some(if lang == DEFAULT_VOICE_LANG { voice.as_default() } else { voice })
        })
        .collect()
}
