use crate::data::landmarks::{ChipTemplate, CANONICAL_TAG, DEFAULT_DIST_THRESH_RATIO};
use crate::error::AlignError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub alignment: SearchConfig,
    pub chip_template: Option<ChipTemplate>,
    pub logging: LoggingConfig,
}

/// When a rotation hypothesis is refined by the FOV grid search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoughOffsetGate {
    /// Refine whenever at least one landmark pair qualified.
    #[default]
    Matched,
    /// Refine only when the rough offset is non-zero on both axes. Matches
    /// outputs of older pipelines, which skip a genuinely zero offset too.
    NonZeroAxes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Rotation hypotheses in degrees; each must be a multiple of 90.
    pub search_angles: Vec<u32>,
    /// Chip periods probed along x around the rough offset.
    pub search_range_x: Vec<i32>,
    /// Chip periods probed along y around the rough offset.
    pub search_range_y: Vec<i32>,
    pub downsample_factor: usize,
    /// Upper bound of the intensity range both images are scaled to.
    pub normalize_max: f32,
    /// Chip-grid cell used for landmark matching.
    pub canonical_tag: (i32, i32),
    /// Matching distance as a fraction of the chip period.
    pub dist_thresh_ratio: f64,
    pub rough_offset_gate: RoughOffsetGate,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_angles: vec![0, 90, 180, 270],
            search_range_x: vec![-2, -1, 0, 1, 2],
            search_range_y: vec![-2, -1, 0, 1, 2],
            downsample_factor: 5,
            normalize_max: 100.0,
            canonical_tag: CANONICAL_TAG,
            dist_thresh_ratio: DEFAULT_DIST_THRESH_RATIO,
            rough_offset_gate: RoughOffsetGate::Matched,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.search_angles.is_empty() {
            errors.push("search_angles must not be empty".to_string());
        }
        for angle in &self.search_angles {
            if angle % 90 != 0 {
                errors.push(AlignError::InvalidAngle(*angle).to_string());
            }
        }

        if self.search_range_x.is_empty() || self.search_range_y.is_empty() {
            errors.push("search ranges must not be empty".to_string());
        }

        if self.downsample_factor == 0 {
            errors.push("downsample_factor must be at least 1".to_string());
        }

        if !(self.normalize_max.is_finite() && self.normalize_max > 0.0) {
            errors.push("normalize_max must be positive".to_string());
        }

        if !(self.dist_thresh_ratio.is_finite() && self.dist_thresh_ratio > 0.0) {
            errors.push("dist_thresh_ratio must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path)?;

        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> crate::Result<()> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = match self.alignment.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        if let Some(template) = &self.chip_template {
            if let Err(e) = template.validate() {
                errors.push(e.to_string());
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

/// Loads and validates `config_path`, falling back to defaults on any error.
///
/// The fallback is reported through `tracing`, so install a subscriber first
/// or the warning is lost.
pub fn load_config_or_default(config_path: Option<&Path>) -> Config {
    let Some(path) = config_path else {
        return Config::default();
    };

    match Config::load_from_file(path) {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(errors) => {
                for error in &errors {
                    tracing::warn!(path = %path.display(), "configuration error: {}", error);
                }
                tracing::warn!("using default configuration instead");
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), "failed to load config: {}", e);
            tracing::warn!("using default configuration");
            Config::default()
        }
    }
}
