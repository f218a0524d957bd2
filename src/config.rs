//! Tunable parameters for the whitening pipeline.
//!
//! Every threshold the pipeline uses lives here with its stock value as the
//! default, so a JSON file only needs to name the fields it overrides.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, WhitenError};

/// File names of the three cascade classifiers, relative to the models directory
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelFiles {
    pub face: String,
    pub eyes: String,
    pub mouth: String,
}

impl Default for ModelFiles {
    fn default() -> Self {
        Self {
            face: "haarcascade_frontalface_default.xml".to_string(),
            eyes: "haarcascade_eye.xml".to_string(),
            mouth: "Mouth.xml".to_string(),
        }
    }
}

/// Multi-scale cascade detection parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Factor between successive pyramid scales (must be > 1)
    pub scale_factor: f64,
    /// Neighbouring hits a grouped detection needs to survive; 0 disables grouping
    pub min_neighbors: u32,
    /// Smallest window side considered, in source pixels
    pub min_size: Option<u32>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.3,
            min_neighbors: 5,
            min_size: None,
        }
    }
}

/// Channel thresholds for the "yellow tooth" mask
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaskThresholds {
    pub red_min: u8,
    pub green_min: u8,
    pub blue_max: u8,
}

impl Default for MaskThresholds {
    fn default() -> Self {
        Self {
            red_min: 150,
            green_min: 150,
            blue_max: 230,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefineParams {
    /// Side of the square structuring element (odd)
    pub kernel_size: u8,
    pub iterations: u32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlendParams {
    /// Multiplier applied to the red+green sum to build the substitute gray
    pub scale: f32,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self { scale: 0.92 }
    }
}

/// Complete whitening configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhitenConfig {
    pub models: ModelFiles,
    pub detection: DetectionParams,
    pub mask: MaskThresholds,
    pub refine: RefineParams,
    pub blend: BlendParams,
    /// Extra pixels (right and bottom) included in diagnostic mouth crops
    pub crop_padding: u32,
    /// Also drop mouth candidates that overlap a detected eye
    pub reject_eye_overlaps: bool,
}

impl Default for WhitenConfig {
    fn default() -> Self {
        Self {
            models: ModelFiles::default(),
            detection: DetectionParams::default(),
            mask: MaskThresholds::default(),
            refine: RefineParams::default(),
            blend: BlendParams::default(),
            crop_padding: 5,
            reject_eye_overlaps: false,
        }
    }
}

impl WhitenConfig {
    /// Load a configuration from a JSON file, falling back to defaults for
    /// any field it leaves out
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WhitenError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: WhitenConfig = serde_json::from_str(text)
            .map_err(|e| WhitenError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.detection.scale_factor > 1.0) {
            return Err(WhitenError::InvalidConfig(format!(
                "detection.scale_factor must be greater than 1, got {}",
                self.detection.scale_factor
            )));
        }
        if self.refine.kernel_size == 0 || self.refine.kernel_size % 2 == 0 {
            return Err(WhitenError::InvalidConfig(format!(
                "refine.kernel_size must be odd, got {}",
                self.refine.kernel_size
            )));
        }
        if !(self.blend.scale > 0.0) {
            return Err(WhitenError::InvalidConfig(format!(
                "blend.scale must be positive, got {}",
                self.blend.scale
            )));
        }
        Ok(())
    }
}
