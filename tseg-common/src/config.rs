//! Configuration loading and patient root resolution
//!
//! Every setting follows the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TSEG_CONFIG";

/// Environment variable naming the patient root directory
pub const PATH_ENV_VAR: &str = "TSEG_PATH";

/// Environment variable naming the predictor executable
pub const PREDICTOR_ENV_VAR: &str = "TSEG_PREDICTOR";

/// Environment variable naming the predictor fold selector
pub const FOLD_ENV_VAR: &str = "TSEG_FOLD";

/// Directory name used under the platform config directory
const APP_DIR_NAME: &str = "tumour-seg";

/// Default external predictor executable
pub const DEFAULT_PREDICTOR_BINARY: &str = "nnUNet_predict";

/// Default fold selector passed to the predictor
pub const DEFAULT_FOLD: &str = "all";

/// Default subject list file name, relative to the patient root
pub const DEFAULT_SUBJECTS_FILE: &str = "subs.txt";

/// Contents of `config.toml`
///
/// All fields are optional in the file; missing tables fall back to their
/// `Default` implementation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Directory holding one sub-directory per patient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Subject list file (relative paths are joined onto `path`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects_file: Option<PathBuf>,

    /// External predictor settings
    #[serde(default)]
    pub predictor: PredictorConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[predictor]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Executable name or path
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Fold selector (`-f`)
    #[serde(default = "default_fold")]
    pub fold: String,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            fold: default_fold(),
        }
    }
}

fn default_binary() -> String {
    DEFAULT_PREDICTOR_BINARY.to_string()
}

fn default_fold() -> String {
    DEFAULT_FOLD.to_string()
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Compiled-in path fallbacks used when neither CLI, environment nor TOML
/// provide a value
///
/// Predictor and logging defaults live on [`PredictorConfig`] and
/// [`LoggingConfig`] so that an absent TOML table and an absent file agree.
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub patient_root: PathBuf,
    pub subjects_file: PathBuf,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        let patient_root = dirs::home_dir()
            .map(|d| d.join("patient_studies"))
            .unwrap_or_else(|| PathBuf::from("./patient_studies"));

        Self {
            patient_root,
            subjects_file: PathBuf::from(DEFAULT_SUBJECTS_FILE),
        }
    }
}

/// Finds the config file to load
///
/// An explicit path (from `--config`) always wins. Otherwise `TSEG_CONFIG`
/// is consulted, then the per-user config directory, then (Linux only)
/// `/etc/tumour-seg/config.toml`.
#[derive(Debug, Default)]
pub struct ConfigLocator {
    explicit: Option<PathBuf>,
}

impl ConfigLocator {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }

    /// Return the explicitly requested path, if any
    pub fn explicit(&self) -> Option<&Path> {
        self.explicit.as_deref()
    }

    /// Return the first candidate path, or `None` when nothing is configured
    ///
    /// The explicit and environment candidates are returned even if the file
    /// does not exist so the caller can report it; implicit candidates are
    /// only returned when present on disk.
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        let user_config = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"));
        if let Some(path) = user_config {
            if path.exists() {
                return Some(path);
            }
        }

        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc").join(APP_DIR_NAME).join("config.toml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration with graceful degradation
///
/// A missing implicit config file yields defaults with a warning. A missing
/// file that was explicitly requested, or any parse failure, is an error.
pub fn load_config(locator: &ConfigLocator) -> Result<TomlConfig> {
    let Some(path) = locator.locate() else {
        debug!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        if locator.explicit().is_some() {
            return Err(Error::NotFound(format!(
                "config file {}",
                path.display()
            )));
        }
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write a config file atomically (temp file + rename)
///
/// The parent directory is created when missing.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

/// Resolve the patient root directory
pub fn resolve_patient_root(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(PATH_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.path {
        return path.clone();
    }

    CompiledDefaults::for_current_platform().patient_root
}

/// Resolve the predictor executable and fold
///
/// Each field is chosen independently: CLI argument, then
/// `TSEG_PREDICTOR` / `TSEG_FOLD`, then the `[predictor]` table (whose
/// serde defaults supply the compiled fallback).
pub fn resolve_predictor(
    cli_binary: Option<&str>,
    cli_fold: Option<&str>,
    config: &TomlConfig,
) -> PredictorConfig {
    PredictorConfig {
        binary: pick_setting(cli_binary, PREDICTOR_ENV_VAR, &config.predictor.binary),
        fold: pick_setting(cli_fold, FOLD_ENV_VAR, &config.predictor.fold),
    }
}

fn pick_setting(cli_arg: Option<&str>, env_var: &str, configured: &str) -> String {
    if let Some(value) = cli_arg.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }

    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => configured.to_string(),
    }
}

/// Resolve the subject list file
///
/// Relative paths are taken relative to the patient root, matching how the
/// subject list is usually kept next to the patient directories.
pub fn resolve_subjects_file(
    cli_arg: Option<&Path>,
    config: &TomlConfig,
    patient_root: &Path,
) -> PathBuf {
    let file = cli_arg
        .map(Path::to_path_buf)
        .or_else(|| config.subjects_file.clone())
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().subjects_file);

    if file.is_absolute() {
        file
    } else {
        patient_root.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.predictor.binary, "nnUNet_predict");
        assert_eq!(config.predictor.fold, "all");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_predictor_table() {
        let config: TomlConfig = toml::from_str("[predictor]\nfold = \"0\"\n").unwrap();
        assert_eq!(config.predictor.binary, DEFAULT_PREDICTOR_BINARY);
        assert_eq!(config.predictor.fold, "0");
    }

    #[test]
    fn test_subjects_file_relative_to_root() {
        let config = TomlConfig::default();
        let root = Path::new("/data/patients");

        let resolved = resolve_subjects_file(None, &config, root);
        assert_eq!(resolved, PathBuf::from("/data/patients/subs.txt"));

        let resolved = resolve_subjects_file(Some(Path::new("/lists/a.txt")), &config, root);
        assert_eq!(resolved, PathBuf::from("/lists/a.txt"));
    }

    #[test]
    fn test_subjects_file_from_config() {
        let config = TomlConfig {
            subjects_file: Some(PathBuf::from("cohort.txt")),
            ..Default::default()
        };
        let resolved = resolve_subjects_file(None, &config, Path::new("/data"));
        assert_eq!(resolved, PathBuf::from("/data/cohort.txt"));
    }
}
