use crate::config::{BlendParams, MaskThresholds, RefineParams};
use crate::detection::{blending, contours, masking, selection};
use crate::detection::detector::ObjectDetector;
use crate::error::Result;
use crate::models::BoundingBox;
use crate::pipeline::{MetadataValue, PipelineContext, PipelineData, PipelineStep};
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, warn};

/// Detect faces - splits the photo into one item per face, or passes the
/// whole photo through when there is none
pub struct FaceDetectionStep {
    pub detector: Arc<dyn ObjectDetector>,
}

impl PipelineStep for FaceDetectionStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let frame = item.image.to_rgb8();
            let origin = item.region();
            let faces = self.detector.detect(&frame)?;
            debug!(detector = self.detector.name(), faces = faces.len(), "face detection");

            // No face: the photo is probably a close-up of the mouth itself
            if faces.is_empty() {
                result.push(item.with_metadata("region_kind", MetadataValue::String("frame".to_string())));
                continue;
            }

            for (index, face) in faces.iter().enumerate() {
                let face = face.clamp_to(frame.width(), frame.height());
                if face.is_empty() {
                    continue;
                }
                let crop = face.crop(&frame);
                let bbox = face.offset_by(&origin);
                context.diagnostics.face(&bbox, &crop)?;

                let face_data = PipelineData::from_region(DynamicImage::ImageRgb8(crop), item.original.clone(), bbox)
                    .with_metadata("region_kind", MetadataValue::String("face".to_string()))
                    .with_metadata("face_index", MetadataValue::Int(index as i64));
                result.push(face_data);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Face Detection"
    }
}

/// Detect mouths inside each face (or the whole photo) and keep the plausible ones
pub struct MouthDetectionStep {
    pub detector: Arc<dyn ObjectDetector>,
    /// When set, candidates overlapping an eye found by this detector are dropped
    pub eyes: Option<Arc<dyn ObjectDetector>>,
    /// Extra right/bottom margin of the diagnostic mouth crop
    pub crop_padding: u32,
}

impl MouthDetectionStep {
    fn select(
        &self,
        item: &PipelineData,
        region: &image::RgbImage,
        candidates: &[BoundingBox],
    ) -> Result<Vec<BoundingBox>> {
        if item.get_string("region_kind") != Some("face") {
            return Ok(selection::largest_mouth_region(candidates).into_iter().collect());
        }

        let mut kept = selection::discard_eye_candidates(candidates, region.height());
        if let Some(eyes) = &self.eyes {
            let eye_boxes = eyes.detect(region)?;
            kept = selection::discard_eye_overlaps(&kept, &eye_boxes);
        }
        Ok(kept)
    }
}

impl PipelineStep for MouthDetectionStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let region = item.image.to_rgb8();
            let origin = item.region();
            let candidates = self.detector.detect(&region)?;
            let mouths = self.select(&item, &region, &candidates)?;
            debug!(
                detector = self.detector.name(),
                candidates = candidates.len(),
                kept = mouths.len(),
                "mouth detection"
            );

            for mouth in mouths {
                let mouth = mouth.clamp_to(region.width(), region.height());
                if mouth.is_empty() {
                    continue;
                }
                let bbox = mouth.offset_by(&origin);
                let padded = mouth.padded(self.crop_padding, region.width(), region.height());
                context.diagnostics.mouth(&bbox, mouth.y, &padded.crop(&region))?;

                let mut mouth_data = PipelineData::from_region(
                    DynamicImage::ImageRgb8(mouth.crop(&region)),
                    item.original.clone(),
                    bbox,
                )
                .with_metadata("region_kind", MetadataValue::String("mouth".to_string()))
                .with_metadata("region_index", MetadataValue::Int(result.len() as i64));
                if let Some(face_index) = item.get_int("face_index") {
                    mouth_data.metadata.insert("face_index".to_string(), MetadataValue::Int(face_index));
                }
                result.push(mouth_data);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Mouth Detection"
    }
}

/// Threshold each mouth crop into a tooth mask
pub struct ToothMaskStep {
    pub thresholds: MaskThresholds,
}

impl PipelineStep for ToothMaskStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let region = item.image.to_rgb8();
            let mask = masking::tooth_mask(&region, &self.thresholds);
            let coverage = masking::mask_coverage(&mask);
            let new_item = item
                .with_image(DynamicImage::ImageLuma8(mask))
                .with_metadata("mask_pixels", MetadataValue::Int(coverage as i64));
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Tooth Mask"
    }
}

/// Keep the largest masked region and dilate it
pub struct ContourRefineStep {
    pub params: RefineParams,
}

impl PipelineStep for ContourRefineStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let mask = item.image.to_luma8();
            let refined = contours::refine_mask(&mask, &self.params);

            if refined.contour_area.is_none() {
                warn!(region = ?item.region(), "no tooth region found, mouth left unchanged");
            }

            let new_item = item
                .with_image(DynamicImage::ImageLuma8(refined.mask))
                .with_metadata("contour_found", MetadataValue::Bool(refined.contour_area.is_some()))
                .with_metadata(
                    "contour_area",
                    MetadataValue::Float(refined.contour_area.unwrap_or(0.0) as f32),
                );
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Contour Refinement"
    }
}

/// Blend the substitute gray into the masked pixels of the source mouth crop
pub struct ColorBlendStep {
    pub params: BlendParams,
}

impl PipelineStep for ColorBlendStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let mask = item.image.to_luma8();
            let region = item.source_pixels();
            let whitened = blending::blend_teeth(&region, &mask, &self.params);
            let new_item = item
                .with_image(DynamicImage::ImageRgb8(whitened))
                .with_metadata(
                    "whitened_pixels",
                    MetadataValue::Int(masking::mask_coverage(&mask) as i64),
                );
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Color Blend"
    }
}
