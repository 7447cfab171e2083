//! Comment payload acquisition, caching, and transcoding.

pub mod cache;
pub mod transcode;

pub use cache::DanmuCache;
pub use transcode::{parse_comments, to_overlay_markup, to_web_json, CommentEntry};

use kandan_common::{Error, Result};

use crate::remote::{DanmuClient, FetchOptions};

/// Make sure the payload for `episode_id` is on disk.
///
/// An existing cache entry short-circuits the download unless `force`
/// is set. Returns true when a download actually happened.
pub async fn ensure_cached(
    client: &DanmuClient,
    cache: &DanmuCache,
    episode_id: i64,
    options: &FetchOptions,
    force: bool,
) -> Result<bool> {
    if !force && cache.contains(episode_id) {
        tracing::debug!(episode_id, "Danmu already cached");
        return Ok(false);
    }

    let body = client.fetch_comments(episode_id, options).await?;
    cache.write(episode_id, &body)?;
    tracing::info!(episode_id, bytes = body.len(), "Cached danmu payload");
    Ok(true)
}

/// Transcode the cached payload for `episode_id` into the XML overlay
/// document. A missing or unparsable cache entry reads as not cached.
pub fn overlay_markup_for(cache: &DanmuCache, episode_id: i64) -> Result<String> {
    let entries = cached_entries(cache, episode_id)?;
    Ok(to_overlay_markup(&entries))
}

/// Transcode the cached payload for `episode_id` into the web player
/// JSON document.
pub fn web_json_for(cache: &DanmuCache, episode_id: i64) -> Result<serde_json::Value> {
    let entries = cached_entries(cache, episode_id)?;
    Ok(to_web_json(&entries))
}

fn cached_entries(cache: &DanmuCache, episode_id: i64) -> Result<Vec<CommentEntry>> {
    let payload = cache.read(episode_id)?;
    parse_comments(&payload).map_err(|e| {
        tracing::warn!(episode_id, error = %e, "Cached danmu payload is unusable");
        Error::not_cached(episode_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfig;
    use assert_matches::assert_matches;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DanmuClient {
        DanmuClient::new(&RemoteConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .with_retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn cached_entry_short_circuits_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/comment/170001"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"comments":[]}"#))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());
        cache.write(170001, r#"{"comments":[]}"#).unwrap();

        let downloaded = ensure_cached(
            &client_for(&server),
            &cache,
            170001,
            &FetchOptions::default(),
            false,
        )
        .await
        .unwrap();
        assert!(!downloaded);
    }

    #[tokio::test]
    async fn force_refetches_existing_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/comment/170001"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"comments":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());
        cache.write(170001, "stale").unwrap();

        let downloaded = ensure_cached(
            &client_for(&server),
            &cache,
            170001,
            &FetchOptions::default(),
            true,
        )
        .await
        .unwrap();
        assert!(downloaded);
        assert_eq!(cache.read(170001).unwrap(), r#"{"comments":[]}"#);
    }

    #[tokio::test]
    async fn download_populates_cache() {
        let server = MockServer::start().await;
        let payload = r#"{"comments":[{"p":"1.0,1,0,9","m":"hi"}]}"#;
        Mock::given(method("GET"))
            .and(path("/api/v2/comment/170002"))
            .respond_with(ResponseTemplate::new(200).set_body_string(payload))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());

        let downloaded = ensure_cached(
            &client_for(&server),
            &cache,
            170002,
            &FetchOptions::default(),
            false,
        )
        .await
        .unwrap();
        assert!(downloaded);
        assert_eq!(cache.read(170002).unwrap(), payload);
    }

    #[test]
    fn transcode_helpers_read_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());
        cache
            .write(5, r#"{"comments":[{"p":"12.5,1,16777215,1001","m":"hello"}]}"#)
            .unwrap();

        let xml = overlay_markup_for(&cache, 5).unwrap();
        assert!(xml.contains("<d p=\"12.5,1,25,16777215,-639093600,0,0,0\">hello</d>"));

        let json = web_json_for(&cache, 5).unwrap();
        assert_eq!(json["data"][0][3], "1001");
    }

    #[test]
    fn unusable_cache_entry_reads_as_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());
        cache.write(6, "truncated garbag").unwrap();

        assert_matches!(
            overlay_markup_for(&cache, 6),
            Err(Error::NotCached { episode_id: 6 })
        );
        assert_matches!(web_json_for(&cache, 7), Err(Error::NotCached { episode_id: 7 }));
    }

    #[test]
    fn payload_with_malformed_entry_reads_as_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());
        cache
            .write(
                8,
                r#"{"comments":[{"p":"1.0,1,0,9","m":"ok"},{"p":"bad","m":"x"}]}"#,
            )
            .unwrap();

        // One malformed comment makes the whole payload unusable.
        assert_matches!(
            overlay_markup_for(&cache, 8),
            Err(Error::NotCached { episode_id: 8 })
        );
    }
}
