//! Client for the episode match endpoint.

use std::time::Duration;

use kandan_common::{Error, Result};
use kandan_db::models::VideoRecord;

use crate::config::RemoteConfig;

use super::types::{MatchCandidate, MatchRequest, MatchResponse};
use super::{DEFAULT_RETRY_DELAY, MAX_ATTEMPTS};

/// Result of asking the service to identify one video.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The service committed to exactly one episode.
    Matched(MatchCandidate),
    /// The service returned candidates without committing to one.
    /// An empty list means the service knows nothing about the file.
    Ambiguous(Vec<MatchCandidate>),
    /// The service could not be reached within the retry budget.
    Unavailable,
}

/// HTTP client for `POST /api/v2/match`.
pub struct MatchClient {
    client: reqwest::Client,
    base_url: String,
    retry_delay: Duration,
}

impl MatchClient {
    pub fn new(config: &RemoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the pause between attempts. Used by tests to keep retry
    /// scenarios fast.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn match_url(&self) -> String {
        format!("{}/api/v2/match", self.base_url)
    }

    /// Ask the service to identify `video`.
    ///
    /// Transport errors and unparsable bodies are retried up to
    /// [`MAX_ATTEMPTS`] times; exhaustion yields
    /// [`MatchOutcome::Unavailable`] rather than an error, so one
    /// flaky item cannot abort a batch. A response with `success:
    /// false` is returned as [`Error::ServiceRejected`] immediately.
    pub async fn match_video(&self, video: &VideoRecord) -> Result<MatchOutcome> {
        let request = MatchRequest::from_video(video);

        for attempt in 1..=MAX_ATTEMPTS {
            let response = match self
                .client
                .post(self.match_url())
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        hash = %video.hash,
                        attempt,
                        error = %e,
                        "Match request failed"
                    );
                    self.pause(attempt).await;
                    continue;
                }
            };

            let body: MatchResponse = match response.json().await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(
                        hash = %video.hash,
                        attempt,
                        error = %e,
                        "Match response was not valid JSON"
                    );
                    self.pause(attempt).await;
                    continue;
                }
            };

            if !body.success {
                return Err(Error::service_rejected(
                    body.error_message.unwrap_or_else(|| "unknown error".into()),
                ));
            }

            let mut candidates = body.matches;
            if body.is_matched && !candidates.is_empty() {
                return Ok(MatchOutcome::Matched(candidates.remove(0)));
            }
            return Ok(MatchOutcome::Ambiguous(candidates));
        }

        tracing::warn!(hash = %video.hash, "Match attempts exhausted");
        Ok(MatchOutcome::Unavailable)
    }

    async fn pause(&self, attempt: u32) {
        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}
