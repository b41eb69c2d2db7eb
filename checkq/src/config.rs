//! Configuration for checkq.
//!
//! Config file resolution order:
//! 1. Explicit path passed to Config::load_from()
//! 2. CHECKQ_CONFIG environment variable
//! 3. Default: platform config dir, e.g. ~/.config/checkq/config.toml

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::query::{serialize, Query};
use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CHECKQ_CONFIG";

/// checkq configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base address of the Graphite server.
    #[serde(default = "default_graphite_addr")]
    pub graphite_addr: String,

    /// Base address of the service answering `/check` queries.
    #[serde(default = "default_check_addr")]
    pub check_addr: String,
}

fn default_graphite_addr() -> String {
    "http://localhost:8080".to_string()
}

fn default_check_addr() -> String {
    "http://localhost:8000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graphite_addr: default_graphite_addr(),
            check_addr: default_check_addr(),
        }
    }
}

/// Prepend `http://` when no scheme is given and drop trailing slashes.
pub fn normalize_addr(addr: &str) -> String {
    let addr = addr.trim();
    let addr = if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    };
    addr.trim_end_matches('/').to_string()
}

impl Config {
    /// Load config from the default location, or use defaults if absent.
    pub fn load() -> Result<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.normalize();
        Ok(config)
    }

    /// Save config to the given file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn normalize(&mut self) {
        self.graphite_addr = normalize_addr(&self.graphite_addr);
        self.check_addr = normalize_addr(&self.check_addr);
    }

    /// Absolute URL for issuing `q` against the check service.
    pub fn check_url(&self, q: &Query) -> String {
        format!("{}{}", self.check_addr, serialize(q))
    }
}

/// Resolve the config file path using the standard resolution order.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // 2. XDG config directory (via directories crate)
    ProjectDirs::from("", "", "checkq").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Aggregate, CompareOp, Comparison};
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.graphite_addr, "http://localhost:8080");
        assert_eq!(config.check_addr, "http://localhost:8000");
    }

    #[test]
    fn test_normalize_addr() {
        assert_eq!(normalize_addr("graphite:80"), "http://graphite:80");
        assert_eq!(normalize_addr("https://graphite/"), "https://graphite");
        assert_eq!(normalize_addr("http://graphite//"), "http://graphite");
    }

    #[test]
    fn test_config_missing_file() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "graphite_addr = \"graphite.internal:8080/\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.graphite_addr, "http://graphite.internal:8080");
        assert_eq!(config.check_addr, "http://localhost:8000");
    }

    #[test]
    fn test_config_bad_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "graphite_addr = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/config.toml");

        let config = Config {
            graphite_addr: "https://graphite.example".to_string(),
            check_addr: "http://checks:9000".to_string(),
        };
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_check_url() {
        let q = Query::new(
            "a",
            "1h".parse().unwrap(),
            "0s".parse().unwrap(),
            vec![Comparison::new(Aggregate::Max, CompareOp::Lt, 3.0)],
        );
        assert_eq!(
            Config::default().check_url(&q),
            "http://localhost:8000/check?metric=a&from=1h&until=0s&limit=max%3C3"
        );
    }
}
