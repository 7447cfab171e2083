//! Shared test harness: an application context backed by an in-memory
//! database and a throwaway data directory, optionally served over a
//! random port.

use std::net::SocketAddr;

use kandan::config::Config;
use kandan::server::create_router;
use kandan::state::AppContext;
use kandan_db::models::{BindingRecord, VideoRecord};
use kandan_db::pool::init_memory_pool;
use kandan_db::queries;
use tempfile::TempDir;

pub struct TestHarness {
    pub ctx: AppContext,
    _tmp: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Build a harness after letting the caller tweak the config.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        config.library.data_dir = tmp.path().join("data");
        adjust(&mut config);

        let pool = init_memory_pool().expect("in-memory pool");
        let ctx = AppContext::new(config, pool);
        Self { ctx, _tmp: tmp }
    }

    /// Serve the harness on a random local port.
    pub async fn with_server(self) -> (Self, SocketAddr) {
        let app = create_router(self.ctx.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        (self, addr)
    }

    pub fn seed_video(&self, hash: &str, file_name: &str) {
        let mut conn = self.ctx.db_pool.get().unwrap();
        queries::videos::insert_videos_if_absent(
            &mut conn,
            &[VideoRecord {
                hash: hash.to_string(),
                file_name: file_name.to_string(),
                file_path: format!("/anime/{file_name}.mkv"),
                file_size: 1024,
                duration_secs: 1440,
                last_watched: None,
            }],
        )
        .unwrap();
    }

    pub fn seed_binding(&self, hash: &str, episode_id: i64) {
        let mut conn = self.ctx.db_pool.get().unwrap();
        queries::bindings::insert_bindings_if_absent(
            &mut conn,
            &[BindingRecord {
                hash: hash.to_string(),
                anime_id: 17,
                episode_id,
                anime_title: "Some Show".to_string(),
                episode_title: format!("Episode {episode_id}"),
                source_type: "tvseries".to_string(),
                source_type_desc: "TV Series".to_string(),
                shift_secs: 0,
            }],
        )
        .unwrap();
    }
}
