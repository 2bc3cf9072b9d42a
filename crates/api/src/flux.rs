//! Flux Kontext Pro client
//!
//! Submits an image transformation job and polls the returned URL until the
//! job settles. Polling is a bounded retry: fixed 2-second interval, hard
//! attempt cap. A 404 from the polling URL means the job is not visible yet
//! and is retryable; an explicit `Error` status is terminal.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLL_ATTEMPTS: u32 = 60;

const TRANSFORMATION_PROMPT: &str = "Transform this person into a professional corporate headshot \
while keeping their face, facial features, and identity exactly the same. Change the lighting to \
soft, professional studio lighting with even illumination on the face. Replace the background with \
a clean, neutral gradient. Improve the clothing to business professional attire - add a well-fitted \
blazer or business shirt. Enhance skin texture to be smooth and polished but maintain natural \
appearance. Ensure sharp focus on the eyes with professional catchlight reflections. Keep the \
person's expression confident and approachable with a subtle professional smile. Make this \
LinkedIn-ready quality.";

#[derive(Debug, Error)]
pub enum FluxError {
    #[error("flux api request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transformation failed: {0}")]
    Job(String),

    #[error("transformation timed out")]
    Timeout,
}

#[derive(Clone)]
pub struct FluxClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
    polling_url: String,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    result: Option<PollResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PollResult {
    sample: String,
}

/// A completed transformation job.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub job_id: String,
    pub image_url: String,
}

impl FluxClient {
    /// `None` when either setting is absent; the transform endpoint is then
    /// disabled.
    pub fn from_config(base_url: Option<String>, api_key: Option<String>) -> Option<Self> {
        match (base_url, api_key) {
            (Some(base_url), Some(api_key)) => Some(Self {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
            }),
            _ => None,
        }
    }

    /// Submit an image and wait for the transformed result.
    pub async fn transform(&self, image_base64: &str) -> Result<TransformOutput, FluxError> {
        let submit: SubmitResponse = self
            .http
            .post(format!("{}/v1/flux-kontext-pro", self.base_url))
            .header("x-key", &self.api_key)
            .json(&serde_json::json!({
                "prompt": TRANSFORMATION_PROMPT,
                "input_image": image_base64,
                "aspect_ratio": "1:1",
                "output_format": "png",
                "safety_tolerance": 2,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::info!(job_id = %submit.id, "transformation job submitted");

        let image_url = self.poll(&submit.polling_url).await?;
        Ok(TransformOutput {
            job_id: submit.id,
            image_url,
        })
    }

    async fn poll(&self, polling_url: &str) -> Result<String, FluxError> {
        for attempt in 0..MAX_POLL_ATTEMPTS {
            let response = self.http.get(polling_url).send().await?;

            // The job may not be visible yet right after submission
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                tracing::debug!(attempt, "transformation job not found yet - retrying");
                tokio::time::sleep(POLL_INTERVAL).await;
                continue;
            }

            let body: PollResponse = response.error_for_status()?.json().await?;
            match body.status.as_str() {
                "Ready" => {
                    return body
                        .result
                        .map(|result| result.sample)
                        .ok_or_else(|| FluxError::Job("ready result missing sample url".to_string()));
                }
                "Error" => {
                    return Err(FluxError::Job(
                        body.error.unwrap_or_else(|| "transformation failed".to_string()),
                    ));
                }
                _ => {
                    tracing::debug!(attempt, status = %body.status, "transformation still processing");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }

        Err(FluxError::Timeout)
    }
}
