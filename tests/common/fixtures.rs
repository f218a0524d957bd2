#![allow(dead_code)]

use image::{Rgb, RgbImage};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use teethwhiten::{BoundingBox, ObjectDetector, Result, TeethWhitener, WhitenConfig};

/// Skin-like background, not yellow under the default thresholds
pub const SKIN: Rgb<u8> = Rgb([120, 110, 100]);
/// Strongly yellow "tooth" color
pub const YELLOW: Rgb<u8> = Rgb([230, 210, 120]);
/// What YELLOW becomes: min(230 + 210, 255) * 0.92, truncated
pub const WHITENED_YELLOW: Rgb<u8> = Rgb([234, 234, 234]);

/// Detector that ignores the image and reports a fixed set of boxes
pub struct FixedDetector {
    name: String,
    boxes: Vec<BoundingBox>,
}

impl FixedDetector {
    pub fn new(name: &str, boxes: Vec<BoundingBox>) -> Arc<dyn ObjectDetector> {
        Arc::new(Self {
            name: name.to_string(),
            boxes,
        })
    }
}

impl ObjectDetector for FixedDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<BoundingBox>> {
        Ok(self.boxes.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Whitener whose detectors always answer with the given boxes
pub fn stub_whitener(
    faces: Vec<BoundingBox>,
    eyes: Vec<BoundingBox>,
    mouths: Vec<BoundingBox>,
    config: WhitenConfig,
) -> TeethWhitener {
    TeethWhitener::with_detectors(
        FixedDetector::new("faces", faces),
        FixedDetector::new("eyes", eyes),
        FixedDetector::new("mouths", mouths),
        config,
    )
}

pub fn fill(img: &mut RgbImage, area: BoundingBox, color: Rgb<u8>) {
    for y in area.y..area.bottom() {
        for x in area.x..area.right() {
            img.put_pixel(x, y, color);
        }
    }
}

/// Photo of plain skin with a yellow block standing in for the teeth
pub fn teeth_photo(width: u32, height: u32, teeth: BoundingBox) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, SKIN);
    fill(&mut img, teeth, YELLOW);
    img
}

/// Assert every pixel outside `allowed` is unchanged
pub fn assert_unchanged_outside(before: &RgbImage, after: &RgbImage, allowed: &BoundingBox) {
    assert_eq!(before.dimensions(), after.dimensions());
    for (x, y, p) in after.enumerate_pixels() {
        if !allowed.contains(x, y) {
            assert_eq!(p, before.get_pixel(x, y), "pixel ({x}, {y}) changed outside {allowed:?}");
        }
    }
}

/// Writes a test photo to a temporary PNG.
/// The file will be automatically cleaned up when dropped.
pub fn create_test_image(img: &RgbImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// One-stage cascade with an 8x8 window: fires when the centre 4x4 block is
/// brighter than the window as a whole
pub const STUMP_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier">
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>8</height>
  <width>8</width>
  <stageParams>
    <maxWeakCount>1</maxWeakCount></stageParams>
  <featureParams>
    <maxCatCount>0</maxCatCount></featureParams>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>5.0e-01</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 5.0e-01</internalNodes>
          <leafValues>
            -1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 8 8 -1.</_>
        <_>
          2 2 4 4 4.</_></rects></_></features></cascade>
</opencv_storage>
"#;

/// The same classifier in the legacy layout
pub const STUMP_CASCADE_LEGACY: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<stump_legacy type_id="opencv-haar-classifier">
  <size>8 8</size>
  <stages>
    <_>
      <!-- stage 0 -->
      <trees>
        <_>
          <!-- tree 0 -->
          <_>
            <!-- root node -->
            <feature>
              <rects>
                <_>0 0 8 8 -1.</_>
                <_>2 2 4 4 4.</_></rects>
              <tilted>0</tilted></feature>
            <threshold>0.5</threshold>
            <left_val>-1.</left_val>
            <right_val>1.</right_val></_></_></trees>
      <stage_threshold>0.5</stage_threshold>
      <parent>-1</parent>
      <next>-1</next></_></stages></stump_legacy>
</opencv_storage>
"#;

/// Write the stump cascade under every model file name the config expects
pub fn write_models(dir: &Path, config: &WhitenConfig) {
    for name in [&config.models.face, &config.models.eyes, &config.models.mouth] {
        std::fs::write(dir.join(name), STUMP_CASCADE).expect("Failed to write model file");
    }
}
