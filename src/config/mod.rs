mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./kandan.toml",
        "~/.config/kandan/config.toml",
        "/etc/kandan/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.matching.concurrency == 0 {
        anyhow::bail!("matching.concurrency must be at least 1");
    }
    if config.matching.chunk_size == 0 {
        anyhow::bail!("matching.chunk_size must be at least 1");
    }
    if config.danmu.concurrency == 0 {
        anyhow::bail!("danmu.concurrency must be at least 1");
    }
    if config.danmu.ch_convert > 2 {
        anyhow::bail!("danmu.ch_convert must be 0, 1, or 2");
    }

    for path in &config.library.paths {
        if !path.exists() {
            tracing::warn!("Library path does not exist: {:?}", path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.matching.chunk_size, 12);
        assert_eq!(config.matching.concurrency, 4);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [library]
            data_dir = "/var/lib/kandan"

            [matching]
            concurrency = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.matching.concurrency, 2);
        assert_eq!(config.matching.chunk_size, 12);
        assert_eq!(config.db_path().to_str().unwrap(), "/var/lib/kandan/kandan.db");
        assert_eq!(config.danmu_dir().to_str().unwrap(), "/var/lib/kandan/danmu");
    }

    #[test]
    fn rejects_zero_workers() {
        let mut config = Config::default();
        config.matching.concurrency = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.danmu.concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_bad_ch_convert() {
        let mut config = Config::default();
        config.danmu.ch_convert = 3;
        assert!(validate_config(&config).is_err());
    }
}
