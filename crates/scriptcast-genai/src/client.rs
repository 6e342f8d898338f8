//! Shared HTTP plumbing for the generative service.

use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::GenAiConfig;
use crate::error::{GenAiError, GenAiResult};

/// Thin REST client for the generative service.
///
/// Owns the HTTP connection pool and the validated configuration. The
/// metadata generator and the video poller borrow it; it holds no per-call
/// state so both can run concurrently over one client.
pub struct GeminiClient {
    http: Client,
    config: GenAiConfig,
}

impl GeminiClient {
    /// Create a new client. Fails fast on an invalid configuration.
    pub fn new(config: GenAiConfig) -> GenAiResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenAiError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    /// `{base}/models/{model}:{method}?key=…`
    pub(crate) fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.base_url, model, method, self.config.api_key
        )
    }

    /// `{base}/{name}?key=…` for server-named resources such as operations.
    pub(crate) fn resource_url(&self, name: &str) -> String {
        format!(
            "{}/{}?key={}",
            self.config.base_url,
            name.trim_start_matches('/'),
            self.config.api_key
        )
    }

    /// POST a JSON body and return the raw response text.
    pub(crate) async fn post_json<B: Serialize>(&self, url: &str, body: &B) -> GenAiResult<String> {
        let response = self.http.post(url).json(body).send().await?;
        Self::text_or_error(response).await
    }

    /// GET a resource and return the raw response text.
    pub(crate) async fn get_text(&self, url: &str) -> GenAiResult<String> {
        let response = self.http.get(url).send().await?;
        Self::text_or_error(response).await
    }

    /// GET a binary asset with the API key appended as a query parameter.
    ///
    /// Any non-success status becomes [`GenAiError::Download`].
    pub(crate) async fn fetch_asset(&self, uri: &str) -> GenAiResult<Response> {
        let mut url = Url::parse(uri)
            .map_err(|e| GenAiError::malformed(format!("invalid video URI: {}", e), uri))?;
        url.query_pairs_mut().append_pair("key", &self.config.api_key);

        debug!("Fetching video asset from {}", uri);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenAiError::Download {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    async fn text_or_error(response: Response) -> GenAiResult<String> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenAiError::remote(format!(
                "service returned {}: {}",
                status, error_text
            )));
        }

        Ok(response.text().await?)
    }
}
