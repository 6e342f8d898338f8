//! ScriptCast command line binary.

mod cli;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scriptcast_genai::{GeminiClient, GenAiConfig, GenAiError, MetadataGenerator, VideoJobPoller};
use scriptcast_models::PlaybackState;
use scriptcast_speech::{CommandEngine, SpeechEngine, SpeechPlaybackController};

use crate::cli::{Cli, Command};

const SPEECH_PUMP_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> ExitCode {
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("Failed to install rustls crypto provider");
        return ExitCode::FAILURE;
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let metrics = if cli.metrics {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    let code = match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    };

    if let Some(handle) = metrics {
        print_metrics(&handle);
    }

    code
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scriptcast=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let script = if cli.command.needs_script() {
        read_script(cli.script.as_deref()).await?
    } else {
        String::new()
    };

    let client = if cli.command.is_remote() {
        let config = GenAiConfig::from_env()?;
        info!("Generative service config: {:?}", config);
        Some(Arc::new(GeminiClient::new(config)?))
    } else {
        None
    };

    match (cli.command, client) {
        (Command::Metadata, Some(client)) => metadata(client, &script).await,
        (Command::Video { out }, Some(client)) => video(client, &script, &out).await,
        (Command::All { out }, Some(client)) => {
            let (meta, clip) = tokio::join!(metadata(client.clone(), &script), video(client, &script, &out));
            meta.and(clip)
        }
        (Command::Voices { lang }, _) => voices(&lang),
        (Command::Speak { voice, lang }, _) => speak(&script, voice.as_deref(), &lang).await,
        (command, None) => Err(anyhow!("no client configured for {:?}", command)),
    }
}

async fn read_script(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read script {}", path.display())),
        None => {
            let mut script = String::new();
            tokio::io::stdin()
                .read_to_string(&mut script)
                .await
                .context("failed to read script from stdin")?;
            Ok(script)
        }
    }
}

async fn metadata(client: Arc<GeminiClient>, script: &str) -> anyhow::Result<()> {
    let generator = MetadataGenerator::new(client);
    let meta = generator.generate_metadata(script).await?;

    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

async fn video(client: Arc<GeminiClient>, script: &str, out: &Path) -> anyhow::Result<()> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling video job");
            let _ = cancel_tx.send(true);
        }
    });

    let poller = VideoJobPoller::new(client).with_cancel(cancel_rx);
    let result = poller
        .generate_video(script, |status| eprintln!("[video] {}", status))
        .await;
    ctrl_c.abort();

    let asset = result?;
    let size = asset.size();
    let path: PathBuf = asset.persist(out)?;
    eprintln!("[video] Saved {} bytes to {}", size, path.display());
    Ok(())
}

fn voices(lang: &str) -> anyhow::Result<()> {
    let controller = SpeechPlaybackController::with_language(CommandEngine::detect()?, lang);

    if controller.voices().is_empty() {
        warn!("No voices found for language '{}'", lang);
    }

    let selected = controller.selected_voice().map(|v| v.uri.clone());
    for voice in controller.voices() {
        let marker = if Some(&voice.uri) == selected.as_ref() { "*" } else { " " };
        println!("{} {:<20} {}", marker, voice.uri, voice.label());
    }
    Ok(())
}

async fn speak(script: &str, voice: Option<&str>, lang: &str) -> anyhow::Result<()> {
    let mut controller = SpeechPlaybackController::with_language(CommandEngine::detect()?, lang);
    controller.set_script(script);
    if let Some(uri) = voice {
        controller.select_voice(uri)?;
    }

    if controller.play() != PlaybackState::Speaking {
        return match controller.last_error() {
            Some(e) => Err(anyhow!("speech playback failed: {}", e)),
            None => Err(anyhow!("nothing to speak")),
        };
    }

    drive_playback(&mut controller, tokio::signal::ctrl_c()).await
}

/// Pump engine events until playback ends or `interrupt` resolves.
///
/// The interrupt future is created once by the caller so a signal that
/// arrives while events are being pumped is still observed.
async fn drive_playback<E, I>(controller: &mut SpeechPlaybackController<E>, interrupt: I) -> anyhow::Result<()>
where
    E: SpeechEngine,
    I: Future,
{
    tokio::pin!(interrupt);

    let mut ticker = tokio::time::interval(SPEECH_PUMP_INTERVAL);
    loop {
        tokio::select! {
            _ = &mut interrupt => {
                info!("Received interrupt, stopping playback");
                controller.stop();
                return Ok(());
            }
            _ = ticker.tick() => {
                if controller.pump() == PlaybackState::Idle {
                    break;
                }
            }
        }
    }

    match controller.last_error() {
        Some(e) => Err(anyhow!("speech playback failed: {}", e)),
        None => Ok(()),
    }
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<GenAiError>() {
        Some(genai) if !genai.is_user_facing() => {
            error!(kind = genai.kind(), "Generation failed: {}", genai);
            eprintln!("Generation failed. Please try again later.");
        }
        _ => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
        }
    }
}

fn print_metrics(handle: &PrometheusHandle) {
    eprintln!("{}", handle.render());
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptcast_models::VoiceDescriptor;
    use scriptcast_speech::{SpeechEvent, SpeechResult, Utterance};
    use std::sync::{Arc, Mutex};

    /// Engine that finishes after a fixed number of pumps.
    #[derive(Default)]
    struct ScriptedEngine {
        log: Arc<Mutex<Vec<&'static str>>>,
        pumps_until_end: Option<usize>,
        current: Option<u64>,
    }

    impl SpeechEngine for ScriptedEngine {
        fn voices(&self) -> Vec<VoiceDescriptor> {
            vec![VoiceDescriptor::new("en", "English", "en").as_default()]
        }

        fn speak(&mut self, utterance: &Utterance) -> SpeechResult<()> {
            self.current = Some(utterance.id);
            self.log.lock().unwrap().push("speak");
            Ok(())
        }

        fn pause(&mut self) {}

        fn resume(&mut self) {}

        fn cancel(&mut self) {
            self.current = None;
            self.log.lock().unwrap().push("cancel");
        }

        fn is_speaking(&self) -> bool {
            self.current.is_some()
        }

        fn poll_events(&mut self) -> Vec<SpeechEvent> {
            match (self.pumps_until_end.as_mut(), self.current) {
                (Some(0), Some(id)) => {
                    self.current = None;
                    vec![SpeechEvent::Ended(id)]
                }
                (Some(n), Some(_)) => {
                    *n -= 1;
                    Vec::new()
                }
                _ => Vec::new(),
            }
        }
    }

    fn speaking_controller(engine: ScriptedEngine) -> SpeechPlaybackController<ScriptedEngine> {
        let mut controller = SpeechPlaybackController::new(engine);
        controller.set_script("Hello there");
        assert_eq!(controller.play(), PlaybackState::Speaking);
        controller
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_stops_playback() {
        let engine = ScriptedEngine::default();
        let log = engine.log.clone();
        let mut controller = speaking_controller(engine);

        let interrupt = tokio::time::sleep(Duration::from_secs(1));
        drive_playback(&mut controller, interrupt).await.unwrap();

        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(*log.lock().unwrap(), vec!["speak", "cancel"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_runs_to_completion() {
        let engine = ScriptedEngine {
            pumps_until_end: Some(3),
            ..Default::default()
        };
        let log = engine.log.clone();
        let mut controller = speaking_controller(engine);

        drive_playback(&mut controller, std::future::pending::<()>()).await.unwrap();

        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(*log.lock().unwrap(), vec!["speak"]);
    }
}
