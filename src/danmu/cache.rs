//! On-disk cache of raw comment payloads, one JSON file per episode.

use std::path::{Path, PathBuf};

use kandan_common::{Error, Result};

/// File cache keyed by episode id. Payloads are stored exactly as the
/// service delivered them.
#[derive(Debug, Clone)]
pub struct DanmuCache {
    dir: PathBuf,
}

impl DanmuCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the cache directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn path_for(&self, episode_id: i64) -> PathBuf {
        self.dir.join(format!("{episode_id}.json"))
    }

    pub fn contains(&self, episode_id: i64) -> bool {
        self.path_for(episode_id).is_file()
    }

    /// Read the cached payload, or [`Error::NotCached`] when no entry
    /// exists.
    pub fn read(&self, episode_id: i64) -> Result<String> {
        match std::fs::read_to_string(self.path_for(episode_id)) {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_cached(episode_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store a payload verbatim, replacing any existing entry.
    pub fn write(&self, episode_id: i64, body: &str) -> Result<()> {
        self.ensure_dir()?;
        std::fs::write(self.path_for(episode_id), body)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn write_then_read_roundtrips_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());
        let payload = r#"{"comments":[{"p":"1.0,1,16777215,42","m":"hi"}]}"#;

        assert!(!cache.contains(170001));
        cache.write(170001, payload).unwrap();
        assert!(cache.contains(170001));
        assert_eq!(cache.read(170001).unwrap(), payload);
    }

    #[test]
    fn missing_entry_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());
        let err = cache.read(999).unwrap_err();
        assert_matches!(err, Error::NotCached { episode_id: 999 });
    }

    #[test]
    fn write_creates_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path().join("nested").join("danmu"));
        cache.write(1, "{}").unwrap();
        assert!(cache.path_for(1).is_file());
    }

    #[test]
    fn overwrite_replaces_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DanmuCache::new(dir.path());
        cache.write(1, "old").unwrap();
        cache.write(1, "new").unwrap();
        assert_eq!(cache.read(1).unwrap(), "new");
    }
}
