use std::{
    fs,
    path::{Path, PathBuf},
};

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request body cap (25 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Configuration failures raised before the server starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File that was requested.
        path: PathBuf,
        /// TOML decoding error.
        source: toml::de::Error,
    },
    /// An environment override could not be decoded.
    #[error("invalid value {value:?} for {var}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
    /// A value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Server settings, layered file → environment → command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Front-end origins allowed to call the API with credentials.
    pub allowed_origins: Vec<String>,
    /// Directory receiving JSON-lines telemetry logs.
    pub log_dir: Option<PathBuf>,
    /// File receiving published domain events.
    pub event_log: Option<PathBuf>,
    /// Multiplier applied to simulated analysis latency.
    pub latency_scale: f64,
    /// Maximum number of stored tables; unbounded when absent.
    pub max_tables: Option<usize>,
    /// Rows returned in upload previews.
    pub preview_rows: usize,
    /// Maximum accepted request body in bytes.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            log_dir: None,
            event_log: None,
            latency_scale: 1.0,
            max_tables: None,
            preview_rows: 10,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Loads `path` when given, otherwise returns defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `CROSSDEBATE_*` and `PORT` overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        if let Some(host) = get("CROSSDEBATE_HOST") {
            self.host = host;
        }
        if let Some(port) = get("PORT") {
            self.port = parse_env("PORT", &port)?;
        }
        if let Some(origins) = get("CROSSDEBATE_ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(dir) = get("CROSSDEBATE_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = get("CROSSDEBATE_EVENT_LOG") {
            self.event_log = Some(PathBuf::from(path));
        }
        if let Some(scale) = get("CROSSDEBATE_LATENCY_SCALE") {
            self.latency_scale = parse_env("CROSSDEBATE_LATENCY_SCALE", &scale)?;
        }
        if let Some(max) = get("CROSSDEBATE_MAX_TABLES") {
            self.max_tables = Some(parse_env("CROSSDEBATE_MAX_TABLES", &max)?);
        }
        if let Some(rows) = get("CROSSDEBATE_PREVIEW_ROWS") {
            self.preview_rows = parse_env("CROSSDEBATE_PREVIEW_ROWS", &rows)?;
        }
        Ok(())
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.latency_scale.is_finite() && self.latency_scale >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "latency_scale must be finite and non-negative, got {}",
                self.latency_scale
            )));
        }
        if self.preview_rows == 0 {
            return Err(ConfigError::Invalid("preview_rows must be at least 1".into()));
        }
        if self.max_tables == Some(0) {
            return Err(ConfigError::Invalid("max_tables must be at least 1".into()));
        }
        if self.body_limit_bytes == 0 {
            return Err(ConfigError::Invalid("body_limit_bytes must be positive".into()));
        }
        self.cors_origins().map(|_| ())
    }

    /// Allowed origins as header values.
    pub fn cors_origins(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| ConfigError::Invalid(format!("invalid CORS origin {origin:?}")))
            })
            .collect()
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_dev_setup() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.allowed_origins.len(), 2);
        assert_eq!(config.preview_rows, 10);
        assert!(config.max_tables.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn file_values_fill_over_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("server.toml");
        fs::write(&path, "port = 9100\nmax_tables = 50\nlatency_scale = 0.0\n").unwrap();
        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.max_tables, Some(50));
        assert!(config.latency_scale.abs() < f64::EPSILON);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn unknown_keys_and_missing_files_fail() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "prot = 1\n").unwrap();
        assert!(matches!(ServerConfig::load(Some(&path)), Err(ConfigError::Parse { .. })));
        let missing = tmp.path().join("absent.toml");
        assert!(matches!(ServerConfig::load(Some(&missing)), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ServerConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "8080"),
                ("CROSSDEBATE_ALLOWED_ORIGINS", "https://app.example.com, http://localhost:4000"),
                ("CROSSDEBATE_PREVIEW_ROWS", "5"),
                ("CROSSDEBATE_HOST", ""),
            ]))
            .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.example.com", "http://localhost:4000"]
        );
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn bad_env_values_are_reported() {
        let mut config = ServerConfig::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let mut config = ServerConfig {
            latency_scale: -0.5,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
        config.latency_scale = f64::NAN;
        assert!(config.validate().is_err());
        config.latency_scale = 1.0;
        config.preview_rows = 0;
        assert!(config.validate().is_err());
        config.preview_rows = 10;
        config.allowed_origins = vec!["http://bad\norigin".into()];
        assert!(config.validate().is_err());
    }
}
