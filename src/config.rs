//! Configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a `config.toml` in the config directory overrides any
//! subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = "processed"  # Where every operation writes its result
//!
//! [quality]
//! resize = 95               # JPEG quality for resize
//! crop = 95                 # JPEG quality for crop and smart crop
//! background = 95           # JPEG quality for generated backgrounds
//! enhance = 98              # JPEG quality for enhancement
//! jpeg = 95                 # JPEG quality when converting to JPEG
//!
//! [background]
//! threshold = 50            # Per-channel distance to the corner color
//! blend_weight = 0.7        # Share of the source when blending over the gradient
//!
//! [cleanup]
//! max_age_hours = 24        # Outputs older than this are swept
//! reserved = ".gitkeep"     # Never deleted
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [logging]
//! level = "info"            # trace, debug, info, warn, error or off
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [background]
//! threshold = 30
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputSettings, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory every operation writes into; created on first use.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// JPEG qualities per operation.
    pub quality: QualityConfig,
    /// Background removal and generation tuning.
    pub background: BackgroundConfig,
    /// Old-output sweep.
    pub cleanup: CleanupConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

fn default_output_dir() -> String {
    "processed".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            quality: QualityConfig::default(),
            background: BackgroundConfig::default(),
            cleanup: CleanupConfig::default(),
            processing: ProcessingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_dir must not be empty".into(),
            ));
        }
        for (key, value) in self.quality.entries() {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "quality.{key} must be 1-100"
                )));
            }
        }
        if !(1..=255).contains(&self.background.threshold) {
            return Err(ConfigError::Validation(
                "background.threshold must be 1-255".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.background.blend_weight) {
            return Err(ConfigError::Validation(
                "background.blend_weight must be 0.0-1.0".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The per-run settings handed to every image operation.
    pub fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            output_dir: PathBuf::from(&self.output_dir),
            resize_quality: Quality::new(self.quality.resize),
            crop_quality: Quality::new(self.quality.crop),
            background_quality: Quality::new(self.quality.background),
            enhance_quality: Quality::new(self.quality.enhance),
            jpeg_quality: Quality::new(self.quality.jpeg),
            background_threshold: self.background.threshold.min(255) as u8,
            blend_weight: self.background.blend_weight,
        }
    }
}

/// JPEG encoding quality per operation (1 = worst, 100 = best).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    pub resize: u32,
    pub crop: u32,
    pub background: u32,
    pub enhance: u32,
    /// Used by format conversion to JPEG.
    pub jpeg: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            resize: 95,
            crop: 95,
            background: 95,
            enhance: 98,
            jpeg: 95,
        }
    }
}

impl QualityConfig {
    fn entries(&self) -> [(&'static str, u32); 5] {
        [
            ("resize", self.resize),
            ("crop", self.crop),
            ("background", self.background),
            ("enhance", self.enhance),
            ("jpeg", self.jpeg),
        ]
    }
}

/// Background heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// A pixel is background when every RGB channel is within this distance
    /// of the top-left corner pixel.
    pub threshold: u32,
    /// Share of the source in the source/gradient blend for opaque images.
    pub blend_weight: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            threshold: 50,
            blend_weight: 0.7,
        }
    }
}

/// Old-output sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanupConfig {
    pub max_age_hours: u64,
    /// Filename the sweep never deletes.
    pub reserved: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 24,
            reserved: ".gitkeep".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Log verbosity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn`, `error` or `off`. `RUST_LOG` wins
    /// when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photoedit Configuration
# =======================
#
# Every key is optional. Delete what you don't change; missing keys fall
# back to the values shown here. Unknown keys are an error.

# Directory that receives every generated file. Created when missing.
output_dir = "processed"

# ---------------------------------------------------------------------------
# JPEG quality per operation (1 = smallest file, 100 = best quality).
# PNG and WebP outputs are lossless and ignore these.
# ---------------------------------------------------------------------------
[quality]
resize = 95
crop = 95
background = 95
enhance = 98
# Used when converting to JPEG.
jpeg = 95

# ---------------------------------------------------------------------------
# Background heuristics
# ---------------------------------------------------------------------------
[background]
# remove-bg: a pixel becomes transparent when each of its R, G and B values
# is within this distance of the top-left corner pixel (1-255).
threshold = 50
# generate-bg: share of the original photo when blending an opaque image
# over the generated gradient (0.0-1.0). Transparent images are composited
# by their own alpha instead.
blend_weight = 0.7

# ---------------------------------------------------------------------------
# Cleanup of old outputs
# ---------------------------------------------------------------------------
[cleanup]
# Files in output_dir at least this old are deleted by `photoedit cleanup`.
max_age_hours = 24
# This file name is never deleted.
reserved = ".gitkeep"

# ---------------------------------------------------------------------------
# Parallel processing (batch command)
# ---------------------------------------------------------------------------
[processing]
# Max parallel workers. Omit for auto (= number of CPU cores).
# Values larger than the core count are clamped down.
# max_processes = 4

# ---------------------------------------------------------------------------
# Logging (to stderr). RUST_LOG overrides this when set.
# ---------------------------------------------------------------------------
[logging]
# trace, debug, info, warn, error or off
level = "info"
"##
}
