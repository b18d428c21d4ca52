//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Trained model artifact
    pub model_path: PathBuf,
    /// Address the form is served on
    pub bind_addr: String,
    /// Logging level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("strike_model.json"),
            bind_addr: "127.0.0.1:8501".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve the effective configuration.
    ///
    /// Later layers win: defaults, then the TOML file if given, then
    /// environment variables, then command line values.
    pub fn load(
        file: Option<&Path>,
        model_path: Option<PathBuf>,
        bind_addr: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::layered(file, model_path, bind_addr, |key| std::env::var(key).ok())
    }

    fn layered<F: Fn(&str) -> Option<String>>(
        file: Option<&Path>,
        model_path: Option<PathBuf>,
        bind_addr: Option<String>,
        var: F,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        }
        .with_vars(var);

        if let Some(path) = model_path {
            config.model_path = path;
        }
        if let Some(addr) = bind_addr {
            config.bind_addr = addr;
        }
        Ok(config)
    }

    fn with_vars<F: Fn(&str) -> Option<String>>(mut self, var: F) -> Self {
        if let Some(path) = var("STRIKE_MODEL_PATH") {
            self.model_path = PathBuf::from(path);
        }
        if let Some(addr) = var("STRIKE_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.model_path, PathBuf::from("strike_model.json"));
        assert_eq!(config.bind_addr, "127.0.0.1:8501");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str("model_path = \"models/strike.json\"\n").unwrap();
        assert_eq!(config.model_path, PathBuf::from("models/strike.json"));
        assert_eq!(config.bind_addr, "127.0.0.1:8501");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            AppConfig::from_toml_str("bind_addr = 8501"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STRIKE_MODEL_PATH", "/srv/strike.json"),
            ("LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::default().with_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.model_path, PathBuf::from("/srv/strike.json"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.bind_addr, "127.0.0.1:8501");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"bind_addr = \"0.0.0.0:9000\"\n").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert!(AppConfig::from_file("/nonexistent/strike.toml").is_err());
    }

    fn config_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_beats_file() {
        let file = config_file("model_path = \"file.json\"\nlog_level = \"warn\"\n");
        let vars: HashMap<&str, &str> = [("STRIKE_MODEL_PATH", "env.json")].into_iter().collect();

        let config = AppConfig::layered(Some(file.path()), None, None, |k| {
            vars.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.model_path, PathBuf::from("env.json"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_command_line_beats_env_and_file() {
        let file = config_file("bind_addr = \"0.0.0.0:9000\"\n");
        let vars: HashMap<&str, &str> = [
            ("STRIKE_MODEL_PATH", "env.json"),
            ("STRIKE_BIND_ADDR", "0.0.0.0:9100"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::layered(
            Some(file.path()),
            Some(PathBuf::from("cli.json")),
            Some("127.0.0.1:9200".to_string()),
            |k| vars.get(k).map(|v| v.to_string()),
        )
        .unwrap();
        assert_eq!(config.model_path, PathBuf::from("cli.json"));
        assert_eq!(config.bind_addr, "127.0.0.1:9200");
    }

    #[test]
    fn test_layered_without_overrides_is_default() {
        let config = AppConfig::layered(None, None, None, |_| None).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_layered_missing_file() {
        let result = AppConfig::layered(
            Some(Path::new("/nonexistent/strike.toml")),
            Some(PathBuf::from("cli.json")),
            None,
            |_| None,
        );
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
