//! Client for the comment download endpoint.

use std::time::Duration;

use kandan_common::{Error, Result};

use crate::config::{DanmuConfig, RemoteConfig};

use super::{DEFAULT_RETRY_DELAY, MAX_ATTEMPTS};

/// Query parameters for a comment download.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Only return comments with an id greater than this.
    pub from: i64,
    /// Include comments from related episodes on other sources.
    pub with_related: bool,
    /// Script conversion: 0 none, 1 simplified, 2 traditional.
    pub ch_convert: u8,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            from: 0,
            with_related: true,
            ch_convert: 1,
        }
    }
}

impl FetchOptions {
    pub fn from_config(config: &DanmuConfig) -> Self {
        Self {
            ch_convert: config.ch_convert,
            ..Self::default()
        }
    }
}

/// HTTP client for `GET /api/v2/comment/{episodeId}`.
pub struct DanmuClient {
    client: reqwest::Client,
    base_url: String,
    retry_delay: Duration,
}

impl DanmuClient {
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

    fn comment_url(&self, episode_id: i64) -> String {
        format!("{}/api/v2/comment/{episode_id}", self.base_url)
    }

    /// Download the comment payload for one episode and return it
    /// verbatim.
    ///
    /// The body is only validated to parse as JSON; it is not reshaped,
    /// so the cached file stays byte-identical to what the service
    /// sent. Exhausting the retry budget is an [`Error::Unavailable`];
    /// callers record the episode as skipped rather than failing the
    /// batch.
    pub async fn fetch_comments(&self, episode_id: i64, options: &FetchOptions) -> Result<String> {
        let query = [
            ("from", options.from.to_string()),
            ("withRelated", options.with_related.to_string()),
            ("chConvert", options.ch_convert.to_string()),
        ];

        for attempt in 1..=MAX_ATTEMPTS {
            let response = match self
                .client
                .get(self.comment_url(episode_id))
                .query(&query)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(episode_id, attempt, error = %e, "Comment request failed");
                    self.pause(attempt).await;
                    continue;
                }
            };

            let body = match response.text().await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(episode_id, attempt, error = %e, "Comment body unreadable");
                    self.pause(attempt).await;
                    continue;
                }
            };

            if serde_json::from_str::<serde_json::Value>(&body).is_err() {
                tracing::warn!(episode_id, attempt, "Comment body was not valid JSON");
                self.pause(attempt).await;
                continue;
            }

            return Ok(body);
        }

        Err(Error::Unavailable(format!(
            "comment download failed for episode {episode_id}"
        )))
    }

    async fn pause(&self, attempt: u32) {
        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DanmuClient {
        DanmuClient::new(&RemoteConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .with_retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn returns_body_verbatim() {
        let server = MockServer::start().await;
        let payload = r#"{"count":1,"comments":[{"p":"12.5,1,16777215,1001","m":"hello"}]}"#;
        Mock::given(method("GET"))
            .and(path("/api/v2/comment/170001"))
            .and(query_param("from", "0"))
            .and(query_param("withRelated", "true"))
            .and(query_param("chConvert", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(payload))
            .mount(&server)
            .await;

        let body = client_for(&server)
            .fetch_comments(170001, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(body, payload);
    }

    #[tokio::test]
    async fn non_json_body_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/comment/170001"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/comment/170001"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"comments":[]}"#))
            .mount(&server)
            .await;

        let body = client_for(&server)
            .fetch_comments(170001, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(body, r#"{"comments":[]}"#);
    }

    #[tokio::test]
    async fn exhausted_attempts_are_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/comment/170001"))
            .respond_with(ResponseTemplate::new(200).set_body_string("nope"))
            .expect(3)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_comments(170001, &FetchOptions::default())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Unavailable(_));
    }

    #[tokio::test]
    async fn fetch_options_carry_ch_convert() {
        let config = DanmuConfig {
            ch_convert: 2,
            ..DanmuConfig::default()
        };
        let options = FetchOptions::from_config(&config);
        assert_eq!(options.ch_convert, 2);
        assert_eq!(options.from, 0);
        assert!(options.with_related);
    }
}
