pub mod blending;
pub mod contours;
pub mod detector;
pub mod masking;
pub mod selection;
pub mod steps;

use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::WhitenConfig;
use crate::diagnostics::{DiagnosticsSink, NoDiagnostics};
use crate::error::{Result, WhitenError};
use crate::models::BoundingBox;
use crate::pipeline::{Pipeline, PipelineData};
use detector::{CascadeDetector, ObjectDetector};
use steps::*;

/// Face and mouth detection; the remaining steps run once per mouth
const DETECTION_STEPS: usize = 2;

/// One mouth region that went through the whitening pipeline
#[derive(Debug, Clone)]
pub struct WhitenedRegion {
    /// Position in the source photo
    pub bbox: BoundingBox,
    /// Pixels passing the yellow threshold before refinement
    pub mask_pixels: usize,
    /// False when nothing tooth-colored was found and the region was left as is
    pub contour_found: bool,
    /// Area of the tooth contour that was kept (0 when none was found)
    pub contour_area: f32,
    /// Pixels replaced by the substitute color
    pub whitened_pixels: usize,
}

pub struct WhitenOutcome {
    /// Same size as the input; only pixels inside `regions` may differ
    pub image: RgbImage,
    pub regions: Vec<WhitenedRegion>,
}

/// Main whitening orchestrator
pub struct TeethWhitener {
    config: WhitenConfig,
    face: Arc<dyn ObjectDetector>,
    eyes: Arc<dyn ObjectDetector>,
    mouth: Arc<dyn ObjectDetector>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl TeethWhitener {
    /// Load the three cascade models named in `config` from `models_dir`
    pub fn load(models_dir: &Path, config: WhitenConfig) -> Result<Self> {
        config.validate()?;
        let load = |file: &str| -> Result<Arc<dyn ObjectDetector>> {
            let detector = CascadeDetector::from_file(&models_dir.join(file), config.detection.clone())?;
            Ok(Arc::new(detector))
        };
        let face = load(&config.models.face)?;
        let eyes = load(&config.models.eyes)?;
        let mouth = load(&config.models.mouth)?;
        Ok(Self::with_detectors(face, eyes, mouth, config))
    }

    /// Build a whitener around already constructed detectors
    pub fn with_detectors(
        face: Arc<dyn ObjectDetector>,
        eyes: Arc<dyn ObjectDetector>,
        mouth: Arc<dyn ObjectDetector>,
        config: WhitenConfig,
    ) -> Self {
        Self {
            config,
            face,
            eyes,
            mouth,
            diagnostics: Arc::new(NoDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn config(&self) -> &WhitenConfig {
        &self.config
    }

    /// The five-step pipeline this whitener runs
    pub fn pipeline(&self) -> Pipeline {
        let eyes = self.config.reject_eye_overlaps.then(|| self.eyes.clone());

        Pipeline::new()
            .with_diagnostics(self.diagnostics.clone())
            .add_step(Arc::new(FaceDetectionStep {
                detector: self.face.clone(),
            }))
            .add_step(Arc::new(MouthDetectionStep {
                detector: self.mouth.clone(),
                eyes,
                crop_padding: self.config.crop_padding,
            }))
            .add_step(Arc::new(ToothMaskStep {
                thresholds: self.config.mask.clone(),
            }))
            .add_step(Arc::new(ContourRefineStep {
                params: self.config.refine.clone(),
            }))
            .add_step(Arc::new(ColorBlendStep {
                params: self.config.blend.clone(),
            }))
    }

    /// Whiten the teeth of every mouth found in `photo`.
    ///
    /// Mouths are processed one after another, each reading the image as left
    /// by the ones before it, so overlapping boxes keep earlier whitening.
    /// Fails with [`WhitenError::NoFaceOrMouthDetected`] when no mouth region
    /// survives selection.
    pub fn whiten(&self, photo: &RgbImage) -> Result<WhitenOutcome> {
        let pipeline = self.pipeline();
        let mouths = pipeline.run_partial(photo.clone(), DETECTION_STEPS)?;
        if mouths.is_empty() {
            return Err(WhitenError::NoFaceOrMouthDetected);
        }

        let mut image = photo.clone();
        let mut regions = Vec::new();
        for mouth in &mouths {
            let current = Arc::new(image.clone());
            for item in pipeline.resume(vec![mouth.rebased(current)], DETECTION_STEPS)? {
                let bbox = item.region();
                blending::paste_region(&mut image, &item.image.to_rgb8(), &bbox);
                regions.push(region_summary(&item));
            }
        }

        self.diagnostics.finish(photo)?;
        info!(
            mouths = regions.len(),
            whitened_pixels = regions.iter().map(|r| r.whitened_pixels).sum::<usize>(),
            "whitening finished"
        );

        Ok(WhitenOutcome { image, regions })
    }
}

fn region_summary(item: &PipelineData) -> WhitenedRegion {
    let count = |key: &str| item.get_int(key).unwrap_or(0).max(0) as usize;
    WhitenedRegion {
        bbox: item.region(),
        mask_pixels: count("mask_pixels"),
        contour_found: item.get_bool("contour_found").unwrap_or(false),
        contour_area: item.get_float("contour_area").unwrap_or(0.0),
        whitened_pixels: count("whitened_pixels"),
    }
}
