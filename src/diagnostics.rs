//! Optional side outputs of a whitening run.
//!
//! The pipeline reports every face crop, mouth crop and step result to a
//! [`DiagnosticsSink`]. The default sink drops everything; [`FsDiagnostics`]
//! writes them under a debug directory.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use crate::error::{Result, WhitenError};
use crate::models::BoundingBox;
use crate::pipeline::PipelineData;

const FACE_DIR: &str = "unknowfaces";
const MOUTH_DIR: &str = "unknowmouths";
const STEP_DIR: &str = "steps";

pub trait DiagnosticsSink: Send + Sync {
    /// A detected face, in source photo coordinates
    fn face(&self, _face: &BoundingBox, _crop: &RgbImage) -> Result<()> {
        Ok(())
    }

    /// A selected mouth in source photo coordinates; `local_y` is its offset
    /// inside the region it was found in
    fn mouth(&self, _mouth: &BoundingBox, _local_y: u32, _crop: &RgbImage) -> Result<()> {
        Ok(())
    }

    /// Items produced by pipeline step `index` (1-based)
    fn step(&self, _index: usize, _name: &str, _items: &[PipelineData]) -> Result<()> {
        Ok(())
    }

    /// Called once after the pipeline ran on `source`
    fn finish(&self, _source: &RgbImage) -> Result<()> {
        Ok(())
    }
}

/// Sink that discards everything
pub struct NoDiagnostics;

impl DiagnosticsSink for NoDiagnostics {}

/// Writes diagnostics below a root directory:
///
/// - `unknowfaces/face_<y>.jpg` for every face
/// - `unknowmouths/mouth_<y>.jpg` for every mouth
/// - `steps/NN_<step>/NN.png` for every step output, numbered by mouth once
///   mouths are known
/// - `annotated.png`, the source with faces boxed in green and mouths in blue
pub struct FsDiagnostics {
    root: PathBuf,
    faces: Mutex<Vec<BoundingBox>>,
    mouths: Mutex<Vec<BoundingBox>>,
}

impl FsDiagnostics {
    /// The directory must be empty or non-existent
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.exists() {
            let mut entries =
                std::fs::read_dir(&root).map_err(|e| WhitenError::unwritable(&root, e))?;
            if entries.next().is_some() {
                return Err(WhitenError::unwritable(&root, "debug directory is not empty"));
            }
        }
        for dir in [FACE_DIR, MOUTH_DIR, STEP_DIR] {
            let path = root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| WhitenError::unwritable(&path, e))?;
        }
        Ok(Self {
            root,
            faces: Mutex::new(Vec::new()),
            mouths: Mutex::new(Vec::new()),
        })
    }

    fn save(&self, path: PathBuf, image: &RgbImage) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        image
            .save(&path)
            .map_err(|e| WhitenError::unwritable(&path, e))?;
        debug!(path = %path.display(), "saved diagnostic image");
        Ok(())
    }
}

impl DiagnosticsSink for FsDiagnostics {
    fn face(&self, face: &BoundingBox, crop: &RgbImage) -> Result<()> {
        self.faces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(*face);
        let path = self.root.join(FACE_DIR).join(format!("face_{}.jpg", face.y));
        self.save(path, crop)
    }

    fn mouth(&self, mouth: &BoundingBox, local_y: u32, crop: &RgbImage) -> Result<()> {
        self.mouths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(*mouth);
        let path = self.root.join(MOUTH_DIR).join(format!("mouth_{}.jpg", local_y));
        self.save(path, crop)
    }

    fn step(&self, index: usize, name: &str, items: &[PipelineData]) -> Result<()> {
        let step_dir_name = format!("{:02}_{}", index, name.to_lowercase().replace(' ', "_"));
        let step_dir = self.root.join(STEP_DIR).join(&step_dir_name);
        std::fs::create_dir_all(&step_dir).map_err(|e| WhitenError::unwritable(&step_dir, e))?;

        for (idx, item) in items.iter().enumerate() {
            if item.image.width() == 0 || item.image.height() == 0 {
                continue;
            }
            let number = item
                .get_int("region_index")
                .map(|i| i as usize)
                .unwrap_or(idx);
            let output_path = step_dir.join(format!("{:02}.png", number + 1));
            item.image
                .save(&output_path)
                .map_err(|e| WhitenError::unwritable(&output_path, e))?;
        }
        debug!(count = items.len(), dir = %step_dir_name, "saved step outputs");
        Ok(())
    }

    fn finish(&self, source: &RgbImage) -> Result<()> {
        let mut annotated = source.clone();
        let faces = self.faces.lock().unwrap_or_else(|p| p.into_inner()).clone();
        let mouths = self.mouths.lock().unwrap_or_else(|p| p.into_inner()).clone();

        for (boxes, color) in [(faces, Rgb([0, 255, 0])), (mouths, Rgb([0, 0, 255]))] {
            for b in boxes.iter().filter(|b| !b.is_empty()) {
                let rect = Rect::at(b.x as i32, b.y as i32).of_size(b.width, b.height);
                draw_hollow_rect_mut(&mut annotated, rect, color);
            }
        }
        self.save(self.root.join("annotated.png"), &annotated)
    }
}
