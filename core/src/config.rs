use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },
    #[error("Failed to read config file: {source}")]
    IoError { source: std::io::Error },
    #[error("Failed to parse config file: {source}")]
    ParseError { source: serde_json::Error },
    #[error("Failed to parse TOML config: {source}")]
    TomlParseError { source: toml::de::Error },
    #[error("Failed to write TOML config: {source}")]
    TomlSerializeError { source: toml::ser::Error },
    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

/// Outcome of the config file search.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// File the configuration came from, `None` for defaults.
    pub source: Option<PathBuf>,
    /// Candidates that exist but failed to load.
    pub skipped: Vec<(PathBuf, String)>,
}

impl LoadReport {
    pub fn log(&self) {
        for (path, reason) in &self.skipped {
            tracing::warn!("Failed to load config from {}: {}", path.display(), reason);
        }
        match &self.source {
            Some(path) => tracing::info!("Loaded configuration from {}", path.display()),
            None => tracing::info!("Using default configuration"),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base location of the generation backend, e.g. `http://host/api`
    pub api_base_url: String,
    /// Delay between status polls
    pub poll_interval_ms: u64,
    /// Per-request timeout; transport default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Where downloaded decks and narration are written
    pub output_dir: PathBuf,
    /// Default presentation language code
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: None,
            output_dir: PathBuf::from("presentations"),
            language: "en".to_string(),
            log_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError { source: e })?;

        let config: Config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::TomlParseError { source: e })?
        } else {
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError { source: e })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with default fallback.
    ///
    /// Nothing is logged here; callers log the report once their
    /// subscriber is installed.
    pub fn load_with_fallback() -> (Self, LoadReport) {
        let mut candidates: Vec<PathBuf> = [
            ".deck/config.toml",
            ".deck/config.json",
            "deck.config.toml",
            "deck.config.json",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        if let Some(user) = Self::user_config_path() {
            candidates.push(user);
        }
        Self::load_first(&candidates)
    }

    /// First candidate that exists and parses wins.
    pub fn load_first(candidates: &[PathBuf]) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => {
                    report.source = Some(path.clone());
                    return (config, report);
                }
                Err(e) => report.skipped.push((path.clone(), e.to_string())),
            }
        }
        (Self::default(), report)
    }

    /// `<config dir>/deck/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("deck").join("config.toml"))
    }

    /// Apply `DECK_API_URL`, `DECK_OUTPUT_DIR` and `DECK_LOG_PATH`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DECK_API_URL").filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = lookup("DECK_OUTPUT_DIR").filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("DECK_LOG_PATH").filter(|v| !v.is_empty()) {
            self.log_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                value: self.api_base_url.clone(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::to_string_pretty(self)
                .map_err(|e| ConfigError::TomlSerializeError { source: e })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::ParseError { source: e })?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError { source: e })?;
        }
        std::fs::write(path, contents).map_err(|e| ConfigError::IoError { source: e })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("deck.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_load_partial_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"https://decks.example.com/api\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.api_base_url, "https://decks.example.com/api");
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_load_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("deck.config.json");
        std::fs::write(&path, r#"{"poll_interval_ms": 500, "language": "fr"}"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.language, "fr");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "poll_interval_ms = 0\n").unwrap();

        assert!(matches!(
            Config::load_from_file(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_broken_candidate_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let broken = tmp.path().join("deck.config.toml");
        let good = tmp.path().join("config.json");
        std::fs::write(&broken, "poll_interval_ms = \"soon\"").unwrap();
        std::fs::write(&good, r#"{"language":"ja"}"#).unwrap();
        let missing = tmp.path().join("absent.toml");

        let (config, report) = Config::load_first(&[missing, broken.clone(), good.clone()]);
        assert_eq!(config.language, "ja");
        assert_eq!(report.source, Some(good));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, broken);
    }

    #[test]
    fn test_no_candidates_gives_defaults() {
        let (config, report) = Config::load_first(&[]);
        assert_eq!(config, Config::default());
        assert!(report.source.is_none());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load_from_file("/definitely/not/here.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.output_dir = PathBuf::from("/srv/decks");
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("DECK_API_URL", "http://backend:8080/api"),
            ("DECK_OUTPUT_DIR", ""),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "http://backend:8080/api");
        // empty values are ignored
        assert_eq!(config.output_dir, PathBuf::from("presentations"));
    }
}
