use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub danmu: DanmuConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root directory for the database and danmu cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directories scanned for video files.
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Number of concurrent fingerprint workers during a scan.
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_scan_concurrency() -> usize {
    4
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            paths: Vec::new(),
            scan_concurrency: default_scan_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Base URL of the metadata service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.dandanplay.net".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Number of concurrent match requests.
    #[serde(default = "default_match_concurrency")]
    pub concurrency: usize,

    /// Videos per chunk; matched rows are persisted between chunks.
    /// Recommended 3-4x the concurrency so one DB write amortizes over a
    /// batch.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_match_concurrency() -> usize {
    4
}
fn default_chunk_size() -> usize {
    12
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_match_concurrency(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DanmuConfig {
    /// Number of concurrent comment downloads.
    #[serde(default = "default_danmu_concurrency")]
    pub concurrency: usize,

    /// Fetch comments on demand when a playback client requests an
    /// episode with no cached payload.
    #[serde(default = "default_fetch_on_demand")]
    pub fetch_on_demand: bool,

    /// Script conversion requested from the service:
    /// 0 = none, 1 = simplified Chinese, 2 = traditional Chinese.
    #[serde(default = "default_ch_convert")]
    pub ch_convert: u8,
}

fn default_danmu_concurrency() -> usize {
    8
}
fn default_fetch_on_demand() -> bool {
    true
}
fn default_ch_convert() -> u8 {
    1
}

impl Default for DanmuConfig {
    fn default() -> Self {
        Self {
            concurrency: default_danmu_concurrency(),
            fetch_on_demand: default_fetch_on_demand(),
            ch_convert: default_ch_convert(),
        }
    }
}

impl Config {
    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.library.data_dir.join("kandan.db")
    }

    /// Directory holding the per-episode danmu cache.
    pub fn danmu_dir(&self) -> PathBuf {
        self.library.data_dir.join("danmu")
    }
}
