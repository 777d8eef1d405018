//! Configuration models for resumable.
//!
//! Every option of the progress loader, saver and exporter can be given a
//! default in a TOML file. All fields are optional.

use crate::checkpoint::{LoadOptions, Precedence, ProgressMode, SaveOptions};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Top-level configuration for resumable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Progress loader defaults
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Progress saver defaults
    #[serde(default)]
    pub save: SaveConfig,

    /// Text export defaults
    #[serde(default)]
    pub export: ExportConfig,
}

/// Defaults for `load_progress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Save file or directory (supports `${VAR}`)
    #[serde(default = "default_dir")]
    pub save: String,

    #[serde(default)]
    pub mode: ProgressMode,

    #[serde(default)]
    pub precedence: Precedence,

    /// Start with empty progress when neither input nor save exist
    #[serde(default)]
    pub allow_empty: bool,

    /// Keys dropped from loaded records
    #[serde(default)]
    pub rejected: Vec<String>,

    /// Keys that keep the lower-precedence value
    #[serde(default)]
    pub excepted: Vec<String>,
}

fn default_dir() -> String {
    ".".to_string()
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            save: default_dir(),
            mode: ProgressMode::default(),
            precedence: Precedence::default(),
            allow_empty: false,
            rejected: Vec::new(),
            excepted: Vec::new(),
        }
    }
}

/// Defaults for `save_progress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Directory used when the save path is suggested from the input
    #[serde(default = "default_dir")]
    pub fallback_dir: String,

    /// Keys never written
    #[serde(default)]
    pub rejected: Vec<String>,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            fallback_dir: default_dir(),
            rejected: Vec::new(),
        }
    }
}

/// Defaults for `export_text`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Keys never exported
    #[serde(default)]
    pub rejected: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn from_optional_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::from(&self.progress)
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions::from(&self.save)
    }

    pub fn export_rejected(&self) -> BTreeSet<String> {
        self.export.rejected.iter().cloned().collect()
    }
}

impl From<&ProgressConfig> for LoadOptions {
    fn from(cfg: &ProgressConfig) -> Self {
        LoadOptions {
            save: PathBuf::from(expand_env_vars(&cfg.save)),
            mode: cfg.mode,
            rejected: cfg.rejected.iter().cloned().collect(),
            precedence: cfg.precedence,
            excepted: cfg.excepted.iter().cloned().collect(),
            allow_empty: cfg.allow_empty,
        }
    }
}

impl From<&SaveConfig> for SaveOptions {
    fn from(cfg: &SaveConfig) -> Self {
        SaveOptions {
            rejected: cfg.rejected.iter().cloned().collect(),
            fallback_dir: PathBuf::from(expand_env_vars(&cfg.fallback_dir)),
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid"))
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();

    for cap in env_var_pattern().captures_iter(s) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        let opts = config.load_options();
        assert_eq!(opts.save, PathBuf::from("."));
        assert_eq!(opts.mode, ProgressMode::ResumeOrStart);
        assert_eq!(opts.precedence, Precedence::NewWins);
        assert!(!opts.allow_empty);
        assert!(opts.rejected.is_empty());
        assert_eq!(config.save_options().fallback_dir, PathBuf::from("."));
    }

    #[test]
    fn test_full_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resumable.toml");
        std::fs::write(
            &path,
            r#"
[progress]
save = "out"
mode = "start_only"
precedence = "saved_wins"
allow_empty = true
rejected = ["scratch"]
excepted = ["seed"]

[save]
fallback_dir = "ckpt"
rejected = ["tmp"]

[export]
rejected = ["raw"]
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        let opts = config.load_options();
        assert_eq!(opts.save, PathBuf::from("out"));
        assert_eq!(opts.mode, ProgressMode::StartOnly);
        assert_eq!(opts.precedence, Precedence::SavedWins);
        assert!(opts.allow_empty);
        assert!(opts.rejected.contains("scratch"));
        assert!(opts.excepted.contains("seed"));

        let save = config.save_options();
        assert_eq!(save.fallback_dir, PathBuf::from("ckpt"));
        assert!(save.rejected.contains("tmp"));
        assert!(config.export_rejected().contains("raw"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/resumable.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_bad_mode() {
        let err = toml::from_str::<Config>("[progress]\nmode = \"sideways\"\n").unwrap_err();
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("RESUMABLE_TEST_DIR", "/data/runs");
        assert_eq!(expand_env_vars("${RESUMABLE_TEST_DIR}/ckpt"), "/data/runs/ckpt");
        assert_eq!(
            expand_env_vars("${RESUMABLE_TEST_UNSET_VAR}/ckpt"),
            "${RESUMABLE_TEST_UNSET_VAR}/ckpt"
        );
    }
}
