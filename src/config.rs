//! # Configuration Module
//!
//! Engine tunables and platform directories for Setflow.
//!
//! Configuration is read from `config.toml` in the platform config directory:
//! - Linux: `~/.config/setflow/config.toml`
//! - macOS: `~/Library/Application Support/setflow/config.toml`
//! - Windows: `%APPDATA%\setflow\config.toml`
//!
//! A missing file is not an error; every field has a default. Published
//! playlists land in the platform data directory unless `publish_dir` says
//! otherwise.
//!
//! ```toml
//! bpm_bucket_width = 4.0
//! ink_threshold = 0
//! default_curve_value = 50.0
//! normalize_bpm = false
//! publish_dir = "/home/me/playlists"
//! ```

use crate::cascade::{CascadeContext, DEFAULT_BPM_BUCKET_WIDTH};
use crate::curve::{CurveSampler, DEFAULT_CURVE_VALUE, DEFAULT_INK_THRESHOLD};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "setflow";
const CONFIG_FILE: &str = "config.toml";

/// Tunables for the ordering engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Width in BPM of the tempo buckets used when tempo leads a multi-criteria sort.
    pub bpm_bucket_width: f64,
    /// Opacity a pixel must exceed to count as ink.
    pub ink_threshold: u8,
    /// Target for a leading slot the stroke never reached.
    pub default_curve_value: f64,
    /// Fold incoming tempos into 90–180 BPM.
    pub normalize_bpm: bool,
    /// Where the file publisher writes playlists.
    pub publish_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bpm_bucket_width: DEFAULT_BPM_BUCKET_WIDTH,
            ink_threshold: DEFAULT_INK_THRESHOLD,
            default_curve_value: DEFAULT_CURVE_VALUE,
            normalize_bpm: false,
            publish_dir: None,
        }
    }
}

impl EngineConfig {
    /// Parse TOML, falling back to defaults for absent fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a field has the
    /// wrong type, or if a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Invalid Setflow configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the platform config file when `path` is
    /// `None`. A missing platform file yields defaults; a missing explicit
    /// file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(explicit) => explicit.to_path_buf(),
            None => match get_config_path() {
                Some(default) if default.exists() => default,
                _ => {
                    debug!("No configuration file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration at {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text).with_context(|| format!("In {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if !(self.bpm_bucket_width.is_finite() && self.bpm_bucket_width > 0.0) {
            anyhow::bail!("bpm_bucket_width must be positive, got {}", self.bpm_bucket_width);
        }
        if !(0.0..=100.0).contains(&self.default_curve_value) {
            anyhow::bail!("default_curve_value must be within 0..=100, got {}", self.default_curve_value);
        }
        Ok(())
    }

    #[must_use]
    pub fn cascade_context(&self) -> CascadeContext {
        CascadeContext {
            bpm_bucket_width: self.bpm_bucket_width,
        }
    }

    #[must_use]
    pub fn curve_sampler(&self) -> CurveSampler {
        CurveSampler {
            ink_threshold: self.ink_threshold,
            default_value: self.default_curve_value,
        }
    }

    /// Directory published playlists are written to, created if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined or created.
    pub fn publish_dir(&self) -> Result<PathBuf> {
        let dir = match &self.publish_dir {
            Some(dir) => dir.clone(),
            None => get_data_dir()?.join("playlists"),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create playlist directory at {}", dir.display()))?;
        Ok(dir)
    }
}

/// Path of the platform configuration file, if the platform has a config
/// directory.
#[must_use]
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Returns the platform-appropriate data directory for Setflow, creating it
/// if it does not exist.
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined or created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        ))?;

    let setflow_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&setflow_dir)
        .with_context(|| format!(
            "Failed to create Setflow data directory at {}. Please check file permissions.",
            setflow_dir.display()
        ))?;

    Ok(setflow_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.bpm_bucket_width, 4.0);
        assert_eq!(config.ink_threshold, 0);
        assert_eq!(config.default_curve_value, 50.0);
        assert!(!config.normalize_bpm);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("normalize_bpm = true\nink_threshold = 64\n").unwrap();
        assert!(config.normalize_bpm);
        assert_eq!(config.ink_threshold, 64);
        assert_eq!(config.bpm_bucket_width, DEFAULT_BPM_BUCKET_WIDTH);
        assert_eq!(config.curve_sampler().ink_threshold, 64);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EngineConfig::from_toml_str("bpm_bucket_width = 0.0").is_err());
        assert!(EngineConfig::from_toml_str("default_curve_value = 150.0").is_err());
        assert!(EngineConfig::from_toml_str("ink_threshold = \"high\"").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "bpm_bucket_width = 8.0\n").unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.cascade_context().bpm_bucket_width, 8.0);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EngineConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_publish_dir_override_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out").join("playlists");
        let config = EngineConfig { publish_dir: Some(target.clone()), ..EngineConfig::default() };

        assert_eq!(config.publish_dir().unwrap(), target);
        assert!(target.is_dir());
    }
}
