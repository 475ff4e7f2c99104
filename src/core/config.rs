//! Configuration management with layered hierarchy
//!
//! Values are merged in priority order: built-in defaults, the global user
//! config (`~/.config/partpick/config.yaml`), `partpick.yaml` in the working
//! directory, `PARTPICK_*` environment variables, and finally command-line
//! flags applied by the CLI.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the per-directory config file
pub const LOCAL_CONFIG_FILE: &str = "partpick.yaml";

pub const DEFAULT_OUTPUT: &str = "partpick_selected.csv";
pub const DEFAULT_UNAVAILABLE: &str = "unavailable.csv";
/// First sheet processed by default; sheet 0 holds BOM notes
pub const DEFAULT_SHEET_START: usize = 1;
pub const DEFAULT_DELAY_SECS: f64 = 1.0;

pub const DEFAULT_LCSC_BASE_URL: &str = "https://wmsc.lcsc.com";
pub const DEFAULT_LCSC_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_LCSC_MAX_FAILURES: u32 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings for the live LCSC catalog client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LcscSettings {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Consecutive connection failures before the source counts as down
    pub max_consecutive_failures: Option<u32>,
}

impl LcscSettings {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_LCSC_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_LCSC_TIMEOUT_SECS))
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("partpick/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn max_consecutive_failures(&self) -> u32 {
        self.max_consecutive_failures
            .unwrap_or(DEFAULT_LCSC_MAX_FAILURES)
            .max(1)
    }

    fn merge(&mut self, other: LcscSettings) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.user_agent.is_some() {
            self.user_agent = other.user_agent;
        }
        if other.max_consecutive_failures.is_some() {
            self.max_consecutive_failures = other.max_consecutive_failures;
        }
    }
}

/// partpick configuration with layered hierarchy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source BOM spreadsheet
    pub source: Option<PathBuf>,

    /// CSV file receiving the selected parts
    pub output: Option<PathBuf>,

    /// CSV file receiving families with no buyable part
    pub unavailable: Option<PathBuf>,

    /// First sheet to process (zero-based)
    pub sheet_start: Option<usize>,

    /// Sheet to stop before (zero-based, exclusive); defaults to the sheet count
    pub sheet_end: Option<usize>,

    /// Seconds to wait between supplier queries
    pub delay_secs: Option<f64>,

    /// Offline YAML catalog used instead of the live supplier
    pub catalog: Option<PathBuf>,

    /// Diagnostic logging
    pub verbose: Option<bool>,

    pub lcsc: LcscSettings,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::from_file(&global_path)?);
            }
        }

        let local_path = Self::local_config_path();
        if local_path.exists() {
            config.merge(Self::from_file(&local_path)?);
        }

        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Read a single YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents, path)
    }

    fn from_yaml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "partpick")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Path of the per-directory config file, relative to the working directory
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(LOCAL_CONFIG_FILE)
    }

    /// Overlay `PARTPICK_*` variables; `var` returns a variable's value if set
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(source) = var("PARTPICK_SOURCE") {
            self.source = Some(PathBuf::from(source));
        }
        if let Some(output) = var("PARTPICK_OUTPUT") {
            self.output = Some(PathBuf::from(output));
        }
        if let Some(unavailable) = var("PARTPICK_UNAVAILABLE") {
            self.unavailable = Some(PathBuf::from(unavailable));
        }
        if let Some(catalog) = var("PARTPICK_CATALOG") {
            self.catalog = Some(PathBuf::from(catalog));
        }
        if let Some(delay) = var("PARTPICK_DELAY") {
            let secs = delay.trim().parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                key: "PARTPICK_DELAY".to_string(),
                value: delay.clone(),
                reason: "expected a number of seconds".to_string(),
            })?;
            self.delay_secs = Some(secs);
        }
        Ok(())
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.source.is_some() {
            self.source = other.source;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.unavailable.is_some() {
            self.unavailable = other.unavailable;
        }
        if other.sheet_start.is_some() {
            self.sheet_start = other.sheet_start;
        }
        if other.sheet_end.is_some() {
            self.sheet_end = other.sheet_end;
        }
        if other.delay_secs.is_some() {
            self.delay_secs = other.delay_secs;
        }
        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        self.lcsc.merge(other.lcsc);
    }

    pub fn output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }

    pub fn unavailable(&self) -> PathBuf {
        self.unavailable
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UNAVAILABLE))
    }

    pub fn sheet_start(&self) -> usize {
        self.sheet_start.unwrap_or(DEFAULT_SHEET_START)
    }

    pub fn verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }

    /// Delay between supplier queries; must be a finite, non-negative number
    pub fn inter_query_delay(&self) -> Result<Duration, ConfigError> {
        let secs = self.delay_secs.unwrap_or(DEFAULT_DELAY_SECS);
        Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidValue {
            key: "delay_secs".to_string(),
            value: secs.to_string(),
            reason: "expected a non-negative number of seconds".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(yaml: &str) -> Config {
        Config::from_yaml(yaml, Path::new("test.yaml")).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output(), PathBuf::from("partpick_selected.csv"));
        assert_eq!(config.unavailable(), PathBuf::from("unavailable.csv"));
        assert_eq!(config.sheet_start(), 1);
        assert_eq!(config.sheet_end, None);
        assert_eq!(config.inter_query_delay().unwrap(), Duration::from_secs(1));
        assert!(!config.verbose());
        assert_eq!(config.lcsc.base_url(), "https://wmsc.lcsc.com");
        assert_eq!(config.lcsc.max_consecutive_failures(), 3);
    }

    #[test]
    fn test_parse_yaml() {
        let config = parse(
            "source: bom.xlsx\nsheet_start: 2\nsheet_end: 4\ndelay_secs: 0.5\nlcsc:\n  timeout_secs: 5\n",
        );
        assert_eq!(config.source, Some(PathBuf::from("bom.xlsx")));
        assert_eq!(config.sheet_start(), 2);
        assert_eq!(config.sheet_end, Some(4));
        assert_eq!(config.inter_query_delay().unwrap(), Duration::from_millis(500));
        assert_eq!(config.lcsc.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = parse("   \n");
        assert!(config.source.is_none());
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let err = Config::from_yaml("sheet_start: [nope", Path::new("partpick.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("partpick.yaml"));
    }

    #[test]
    fn test_merge_precedence() {
        let mut base = parse("output: a.csv\nunavailable: na.csv\nlcsc:\n  base_url: http://one\n");
        base.merge(parse("output: b.csv\nlcsc:\n  timeout_secs: 9\n"));

        assert_eq!(base.output(), PathBuf::from("b.csv"));
        assert_eq!(base.unavailable(), PathBuf::from("na.csv"));
        assert_eq!(base.lcsc.base_url(), "http://one");
        assert_eq!(base.lcsc.timeout(), Duration::from_secs(9));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("PARTPICK_OUTPUT", "env.csv"), ("PARTPICK_DELAY", "2.5")]
            .into_iter()
            .collect();

        let mut config = parse("output: file.csv\n");
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.output(), PathBuf::from("env.csv"));
        assert_eq!(config.inter_query_delay().unwrap(), Duration::from_millis(2500));
    }

    #[test]
    fn test_bad_env_delay() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "PARTPICK_DELAY").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let config = parse("delay_secs: -1\n");
        assert!(config.inter_query_delay().is_err());
    }
}
