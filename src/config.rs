use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

const MIN_HTTP_PORT: u16 = 21;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub locale: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            locale: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub http_host: String,
    pub http_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            http_host: "0.0.0.0".to_string(),
            http_port: 9696,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub debug_logging: bool,
    pub json: bool,
    /// Also write a rotating log file.
    pub file: bool,
    /// Defaults to `<data dir>/retroarcher/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// Rotated files kept on disk.
    pub max_files: usize,
    /// Mask public IPv4 addresses, emails and tokens in every log line.
    pub redact: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            debug_logging: true,
            json: false,
            file: true,
            log_dir: None,
            max_files: 5,
            redact: true,
        }
    }
}

impl LoggingConfig {
    pub fn resolved_log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|p| p.join("retroarcher").join("logs")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of ticks retained per series.
    pub history_length: usize,
    pub refresh_interval_ms: u64,
    pub metrics: MetricSelection,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            history_length: 120,
            refresh_interval_ms: 1000,
            metrics: MetricSelection::default(),
        }
    }
}

/// Which metric categories are sampled and charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSelection {
    pub cpu: bool,
    pub memory: bool,
    pub network: bool,
    pub gpu: bool,
    pub processes: bool,
}

impl Default for MetricSelection {
    fn default() -> Self {
        MetricSelection {
            cpu: true,
            memory: true,
            network: true,
            gpu: true,
            processes: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.network.http_port < MIN_HTTP_PORT {
            return Err(Error::Config(format!(
                "network.http_port must be between {MIN_HTTP_PORT} and 65535, got {}",
                self.network.http_port
            )));
        }
        if self.logging.file && self.logging.max_files == 0 {
            return Err(Error::Config(
                "logging.max_files must be at least 1".to_string(),
            ));
        }
        if self.dashboard.history_length == 0 {
            return Err(Error::Config(
                "dashboard.history_length must be at least 1".to_string(),
            ));
        }
        if self.dashboard.refresh_interval_ms == 0 {
            return Err(Error::Config(
                "dashboard.refresh_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.network.http_host, self.network.http_port)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("retroarcher").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return Config::default(),
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "invalid config file, using defaults");
            Config::default()
        }
    }
}

/// Write `config` to `path` as TOML, creating parent directories.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.general.locale, "en");
        assert_eq!(config.network.http_host, "0.0.0.0");
        assert_eq!(config.network.http_port, 9696);
        assert!(config.logging.debug_logging);
        assert!(config.logging.file);
        assert!(config.logging.redact);
        assert_eq!(config.logging.max_files, 5);
        assert!(config.logging.log_dir.is_none());
        assert_eq!(config.dashboard.history_length, 120);
        assert_eq!(config.dashboard.refresh_interval_ms, 1000);
        assert_eq!(config.dashboard.metrics, MetricSelection::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[dashboard]
history_length = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.dashboard.history_length, 30);
        // Other fields should be defaults
        assert_eq!(config.dashboard.refresh_interval_ms, 1000);
        assert_eq!(config.network.http_port, 9696);
        assert!(config.dashboard.metrics.gpu);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[general]
locale = "es"

[network]
http_host = "127.0.0.1"
http_port = 8080

[logging]
debug_logging = false
json = true
log_dir = "/var/log/retroarcher"
max_files = 3
redact = false

[dashboard]
history_length = 60
refresh_interval_ms = 500

[dashboard.metrics]
gpu = false
processes = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.locale, "es");
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert!(!config.logging.debug_logging);
        assert!(config.logging.json);
        assert_eq!(
            config.logging.resolved_log_dir(),
            Some(PathBuf::from("/var/log/retroarcher"))
        );
        assert_eq!(config.logging.max_files, 3);
        assert!(!config.logging.redact);
        assert_eq!(config.dashboard.history_length, 60);
        assert_eq!(config.dashboard.refresh_interval_ms, 500);
        assert!(config.dashboard.metrics.cpu);
        assert!(!config.dashboard.metrics.gpu);
        assert!(!config.dashboard.metrics.processes);
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.network.http_port, 9696);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("retroarcher_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.dashboard.history_length, 120);
        let _ = std::fs::remove_file(&temp);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.network.http_port = 20;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.dashboard.history_length = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.dashboard.refresh_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.logging.max_files = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = std::env::temp_dir().join(format!("retroarcher_cfg_{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");
        let mut config = Config::default();
        config.network.http_port = 9797;
        config.dashboard.metrics.network = false;

        save_config(&path, &config).unwrap();
        let loaded = load_config_from_path(&path);
        assert_eq!(loaded.network.http_port, 9797);
        assert!(!loaded.dashboard.metrics.network);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
