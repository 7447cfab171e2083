//! Shared application context handed to API handlers and CLI commands.

use std::sync::Arc;

use kandan_db::pool::DbPool;

use crate::config::Config;
use crate::danmu::DanmuCache;
use crate::remote::{DanmuClient, MatchClient};

/// Everything a handler needs: configuration, the connection pool, the
/// remote clients, and the danmu cache. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub db_pool: DbPool,
    pub match_client: Arc<MatchClient>,
    pub danmu_client: Arc<DanmuClient>,
    pub danmu_cache: DanmuCache,
}

impl AppContext {
    pub fn new(config: Config, db_pool: DbPool) -> Self {
        let match_client = Arc::new(MatchClient::new(&config.remote));
        let danmu_client = Arc::new(DanmuClient::new(&config.remote));
        let danmu_cache = DanmuCache::new(config.danmu_dir());
        Self {
            config: Arc::new(config),
            db_pool,
            match_client,
            danmu_client,
            danmu_cache,
        }
    }
}
