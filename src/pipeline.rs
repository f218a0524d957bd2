use image::{DynamicImage, RgbImage};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::diagnostics::{DiagnosticsSink, NoDiagnostics};
use crate::error::Result;
use crate::models::BoundingBox;

/// Data that flows through the pipeline
/// Each PipelineData represents a single image region with associated metadata
#[derive(Clone)]
pub struct PipelineData {
    /// The region's current image (photo crop, mask or whitened crop)
    pub image: DynamicImage,

    /// Reference to the source photo (shared efficiently via Arc)
    pub original: Arc<RgbImage>,

    /// Bounding box in the source photo (None means full image)
    pub bbox: Option<BoundingBox>,

    /// Metadata for tracking properties (e.g., "region_kind", "mask_pixels", etc.)
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone)]
pub enum MetadataValue {
    Bool(bool),
    Float(f32),
    String(String),
    Int(i64),
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: RgbImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image: DynamicImage::ImageRgb8(image),
            original,
            bbox: None,
            metadata: HashMap::new(),
        }
    }

    /// Create PipelineData for a region of an image
    pub fn from_region(image: DynamicImage, original: Arc<RgbImage>, bbox: BoundingBox) -> Self {
        Self {
            image,
            original,
            bbox: Some(bbox),
            metadata: HashMap::new(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Same region and metadata with a new image
    pub fn with_image(&self, image: DynamicImage) -> Self {
        Self {
            image,
            original: self.original.clone(),
            bbox: self.bbox,
            metadata: self.metadata.clone(),
        }
    }

    /// Bounding box in the source photo, the whole photo when unset
    pub fn region(&self) -> BoundingBox {
        self.bbox
            .unwrap_or_else(|| BoundingBox::new(0, 0, self.original.width(), self.original.height()))
    }

    /// Untouched source pixels under this item's region
    pub fn source_pixels(&self) -> RgbImage {
        self.region().crop(&self.original)
    }

    /// Same region and metadata, re-cropped from a different source image
    pub fn rebased(&self, source: Arc<RgbImage>) -> Self {
        let image = DynamicImage::ImageRgb8(self.region().crop(&source));
        Self {
            image,
            original: source,
            bbox: self.bbox,
            metadata: self.metadata.clone(),
        }
    }

    /// Get metadata as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as float
    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.metadata.get(key) {
            Some(MetadataValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as integer
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as string
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetadataValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Context available to all pipeline steps
#[derive(Clone)]
pub struct PipelineContext {
    pub diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            diagnostics: Arc::new(NoDiagnostics),
        }
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and diagnostics)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Route crops and per-step outputs to `sink`
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.context.diagnostics = sink;
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order on an input image
    pub fn run(&self, input: RgbImage) -> Result<Vec<PipelineData>> {
        self.run_partial(input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps
    pub fn run_partial(&self, input: RgbImage, num_steps: usize) -> Result<Vec<PipelineData>> {
        // Start with a single PipelineData containing the full image
        let data = vec![PipelineData::from_image(input)];
        self.run_steps(data, 0, num_steps)
    }

    /// Continue items produced by `run_partial(_, first_step)` through the
    /// remaining steps
    pub fn resume(&self, data: Vec<PipelineData>, first_step: usize) -> Result<Vec<PipelineData>> {
        self.run_steps(data, first_step, self.steps.len())
    }

    fn run_steps(&self, mut data: Vec<PipelineData>, start: usize, end: usize) -> Result<Vec<PipelineData>> {
        for (step_idx, step) in self.steps.iter().enumerate().take(end).skip(start) {
            debug!(step = step.name(), items = data.len(), "running step");
            data = step.process(data, &self.context)?;
            self.context
                .diagnostics
                .step(step_idx + 1, step.name(), &data)?;
            debug!(step = step.name(), items = data.len(), "step finished");
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct SplitInHalves;

    impl PipelineStep for SplitInHalves {
        fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
            let mut result = Vec::new();
            for item in data {
                let region = item.region();
                let half = region.width / 2;
                for (i, x) in [0, half].into_iter().enumerate() {
                    let bbox = BoundingBox::new(region.x + x, region.y, half, region.height);
                    let crop = bbox.crop(&item.original);
                    result.push(
                        PipelineData::from_region(DynamicImage::ImageRgb8(crop), item.original.clone(), bbox)
                            .with_metadata("half", MetadataValue::Int(i as i64)),
                    );
                }
            }
            Ok(result)
        }

        fn name(&self) -> &str {
            "Split In Halves"
        }
    }

    #[test]
    fn steps_can_split_items() {
        let img = RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]));
        let pipeline = Pipeline::new()
            .add_step(Arc::new(SplitInHalves))
            .add_step(Arc::new(SplitInHalves));
        assert_eq!(pipeline.step_names(), vec!["Split In Halves", "Split In Halves"]);

        let out = pipeline.run(img.clone()).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[3].bbox, Some(BoundingBox::new(6, 0, 2, 4)));
        assert_eq!(out[3].get_int("half"), Some(1));

        let partial = pipeline.run_partial(img, 1).unwrap();
        assert_eq!(partial.len(), 2);

        let resumed = pipeline.resume(partial, 1).unwrap();
        assert_eq!(resumed.len(), 4);
        assert_eq!(resumed[3].bbox, out[3].bbox);
    }

    #[test]
    fn rebased_item_reads_new_source() {
        let before = Arc::new(RgbImage::from_pixel(6, 6, Rgb([1, 1, 1])));
        let after = Arc::new(RgbImage::from_pixel(6, 6, Rgb([9, 9, 9])));
        let item = PipelineData::from_region(
            DynamicImage::ImageRgb8(RgbImage::new(2, 2)),
            before,
            BoundingBox::new(2, 2, 2, 2),
        )
        .with_metadata("region_index", MetadataValue::Int(3));

        let moved = item.rebased(after);
        assert_eq!(moved.bbox, item.bbox);
        assert_eq!(moved.get_int("region_index"), Some(3));
        assert_eq!(*moved.image.to_rgb8().get_pixel(0, 0), Rgb([9, 9, 9]));
        assert_eq!(*moved.source_pixels().get_pixel(1, 1), Rgb([9, 9, 9]));
    }

    #[test]
    fn region_defaults_to_whole_image() {
        let item = PipelineData::from_image(RgbImage::new(5, 7));
        assert_eq!(item.region(), BoundingBox::new(0, 0, 5, 7));
        assert_eq!(item.source_pixels().dimensions(), (5, 7));
    }
}
