use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::preprocess::ResizeFilter;

pub const ENV_MODEL: &str = "FERRITE_DIGITS_MODEL";
pub const ENV_ADDR: &str = "FERRITE_DIGITS_ADDR";
pub const ENV_LOG: &str = "FERRITE_DIGITS_LOG";

/// Runtime settings shared by the server and the CLI.
///
/// Resolution order: defaults, then an optional JSON file (missing keys
/// keep their defaults), then the `FERRITE_DIGITS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model artifact: a JSON full model or a compiled lite file.
    pub model_path: PathBuf,
    /// Address the HTTP server binds.
    pub addr: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub resize_filter: ResizeFilter,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model_path: PathBuf::from("trained_models/digits.json"),
            addr: "127.0.0.1:7878".to_owned(),
            log_filter: "info".to_owned(),
            resize_filter: ResizeFilter::default(),
        }
    }
}

impl Config {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Defaults or `path`, with environment overrides applied.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let base = match path {
            Some(p) => Config::load_json(p)?,
            None => Config::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies `FERRITE_DIGITS_*` overrides read through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Config {
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.is_empty()) {
            self.model_path = PathBuf::from(model);
        }
        if let Some(addr) = lookup(ENV_ADDR).filter(|v| !v.is_empty()) {
            self.addr = addr;
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log_filter = filter;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "model_path": "models/lite.fnlt", "resize_filter": "nearest" }"#).unwrap();

        let config = Config::load_json(&path).unwrap();
        assert_eq!(config.model_path, PathBuf::from("models/lite.fnlt"));
        assert_eq!(config.resize_filter, ResizeFilter::Nearest);
        assert_eq!(config.addr, Config::default().addr);
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [(ENV_MODEL, "/srv/digits.json"), (ENV_ADDR, ""), (ENV_LOG, "debug")]
            .into_iter()
            .collect();
        let config = Config::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.model_path, PathBuf::from("/srv/digits.json"));
        assert_eq!(config.addr, "127.0.0.1:7878");
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn bad_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "model_path = 3").unwrap();
        assert!(matches!(Config::load_json(&path), Err(ConfigError::Json(_))));
        assert!(matches!(Config::load_json(dir.path().join("nope.json")), Err(ConfigError::Io { .. })));
    }
}
