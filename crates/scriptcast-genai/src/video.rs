//! Long-running video generation.
//!
//! Submits a generation job, polls it at a fixed interval until the server
//! reports completion, then downloads the first generated video into a
//! local [`VideoAssetHandle`]. The service exposes no fractional progress,
//! so callers get a rotating set of human-readable status lines instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use scriptcast_models::{VideoJob, VideoJobPhase};
use serde::Serialize;
use tokio::sync::watch;
use tracing::Instrument;

use crate::asset::VideoAssetHandle;
use crate::client::GeminiClient;
use crate::error::{GenAiError, GenAiResult};
use crate::logging::VideoJobLogger;
use crate::metrics;

/// Status lines emitted while the job runs. The first is sent before the
/// job is submitted; the rest rotate once per poll.
pub const STATUS_MESSAGES: &[&str] = &[
    "Sending your script to the video model...",
    "Storyboarding scenes from the script...",
    "Rendering frames...",
    "Working on motion and lighting...",
    "Longer clips can take a few minutes, still working...",
    "Polishing the final cut...",
];

/// Status line emitted once the server reports completion.
pub const FINALIZING_MESSAGE: &str = "Finalizing video...";

/// Suspends the poll loop between polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// predictLongRunning request.
#[derive(Debug, Serialize)]
struct PredictLongRunningRequest {
    instances: Vec<Instance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct VideoParameters {
    #[serde(rename = "numberOfVideos")]
    number_of_videos: u32,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

/// Submits and polls video generation jobs.
pub struct VideoJobPoller {
    client: Arc<GeminiClient>,
    sleeper: Arc<dyn Sleeper>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl VideoJobPoller {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            sleeper: Arc::new(TokioSleeper),
            cancel_rx: None,
        }
    }

    /// Replace the sleeper used between polls.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Set cancellation signal, checked before every poll and during every wait.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Generate a video for `script`, reporting progress through `on_status`.
    ///
    /// Status lines are emitted in order: one before submission, one per
    /// unfinished snapshot, then [`FINALIZING_MESSAGE`]. The download starts
    /// only after a snapshot with `done == true` has been observed.
    pub async fn generate_video<F>(&self, script: &str, mut on_status: F) -> GenAiResult<VideoAssetHandle>
    where
        F: FnMut(&str) + Send,
    {
        let model = self.client.config().video_model.clone();
        let mut logger = VideoJobLogger::new(&model);
        let span = logger.span();
        let started = Instant::now();
        let mut phase = VideoJobPhase::Submitting;

        let result = self
            .run(script, &model, &mut logger, &mut phase, &mut on_status)
            .instrument(span)
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => metrics::record_video_job(&model, "ok", elapsed),
            Err(e) => {
                logger.log_failure(phase, e);
                metrics::record_video_job(&model, e.kind(), elapsed);
            }
        }

        result
    }

    async fn run(
        &self,
        script: &str,
        model: &str,
        logger: &mut VideoJobLogger,
        phase: &mut VideoJobPhase,
        on_status: &mut (dyn FnMut(&str) + Send),
    ) -> GenAiResult<VideoAssetHandle> {
        if script.trim().is_empty() {
            return Err(GenAiError::EmptyScript);
        }

        let config = self.client.config();
        let interval = config.poll_interval;
        let max_wait = config.max_wait;

        let mut status_index = 0;
        on_status(STATUS_MESSAGES[status_index]);

        self.check_cancelled()?;
        let mut job = self.submit(model, &build_video_prompt(script)).await?;
        logger.set_job(&job.name);
        logger.log_phase(*phase, "Video job submitted");

        *phase = VideoJobPhase::Polling;
        let mut waited = Duration::ZERO;
        let mut attempt = 0u32;

        while !job.done {
            let delay = match max_wait {
                Some(max) if waited >= max => return Err(GenAiError::Timeout { waited }),
                // The last wait stops at the cap
                Some(max) => interval.min(max - waited),
                None => interval,
            };

            status_index = next_status_index(status_index);
            on_status(STATUS_MESSAGES[status_index]);

            self.wait(delay).await?;
            waited += delay;

            self.check_cancelled()?;
            attempt += 1;
            job = self.poll(&job).await?;
            metrics::record_video_poll(model);
            logger.log_poll(attempt, job.done);
        }

        *phase = VideoJobPhase::Finalizing;
        on_status(FINALIZING_MESSAGE);

        if let Some(error) = &job.error {
            return Err(GenAiError::JobFailed {
                code: error.code,
                message: error.message.clone(),
            });
        }

        let uri = job
            .first_video_uri()
            .ok_or(GenAiError::JobIncomplete)?
            .to_string();

        *phase = VideoJobPhase::Downloading;
        logger.log_phase(*phase, "Downloading generated video");
        let response = self.client.fetch_asset(&uri).await?;
        let asset = VideoAssetHandle::from_response(response, &uri).await?;
        metrics::record_download_bytes(asset.size());

        *phase = VideoJobPhase::Ready;
        logger.log_phase(*phase, &format!("Video ready ({} bytes)", asset.size()));
        Ok(asset)
    }

    async fn submit(&self, model: &str, prompt: &str) -> GenAiResult<VideoJob> {
        let request = PredictLongRunningRequest {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: VideoParameters {
                number_of_videos: 1,
                aspect_ratio: "16:9".to_string(),
            },
        };

        let url = self.client.model_url(model, "predictLongRunning");
        let body = self.client.post_json(&url, &request).await?;
        let job = parse_snapshot(&body)?;

        if !job.done && job.name.is_empty() {
            return Err(GenAiError::malformed("submitted job has no handle", body));
        }

        Ok(job)
    }

    /// Fetch a fresh snapshot using the handle from `previous`.
    async fn poll(&self, previous: &VideoJob) -> GenAiResult<VideoJob> {
        let url = self.client.resource_url(&previous.name);
        let body = self.client.get_text(&url).await?;
        let mut job = parse_snapshot(&body)?;

        if job.name.is_empty() {
            job.name = previous.name.clone();
        }

        Ok(job)
    }

    async fn wait(&self, duration: Duration) -> GenAiResult<()> {
        let Some(cancel_rx) = &self.cancel_rx else {
            self.sleeper.sleep(duration).await;
            return Ok(());
        };

        let mut cancel_rx = cancel_rx.clone();
        tokio::select! {
            _ = self.sleeper.sleep(duration) => Ok(()),
            _ = async {
                let signalled = cancel_rx.wait_for(|cancelled| *cancelled).await.is_ok();
                // A dropped sender can never cancel
                if !signalled {
                    std::future::pending::<()>().await;
                }
            } => Err(GenAiError::Cancelled),
        }
    }

    fn check_cancelled(&self) -> GenAiResult<()> {
        match &self.cancel_rx {
            Some(rx) if *rx.borrow() => Err(GenAiError::Cancelled),
            _ => Ok(()),
        }
    }
}

fn parse_snapshot(body: &str) -> GenAiResult<VideoJob> {
    serde_json::from_str(body)
        .map_err(|e| GenAiError::malformed(format!("invalid job snapshot: {}", e), body))
}

fn next_status_index(index: usize) -> usize {
    (index + 1) % STATUS_MESSAGES.len()
}

/// Build the generation prompt for a script.
pub fn build_video_prompt(script: &str) -> String {
    format!(
        r#"Create a short cinematic video that visually represents the following script.

Requirements:
- 16:9 landscape at 720p, photorealistic style with smooth camera movement
- Do not include any on-screen text, captions, logos or watermarks
- Do not show human faces
- Produce a single continuous video

Script:
---
{script}
---
"#
    )
}
