use crate::models::BoundingBox;

/// Mouths sit in the lower half of a face; a candidate starting above the
/// midline of its region is most likely an eye
pub fn is_above_midline(candidate: &BoundingBox, region_height: u32) -> bool {
    (candidate.y as f64) < region_height as f64 / 2.0
}

/// Drop candidates that start above the midline of a `region_height` region
pub fn discard_eye_candidates(candidates: &[BoundingBox], region_height: u32) -> Vec<BoundingBox> {
    candidates
        .iter()
        .filter(|c| !is_above_midline(c, region_height))
        .copied()
        .collect()
}

/// Drop candidates overlapping any detected eye
pub fn discard_eye_overlaps(candidates: &[BoundingBox], eyes: &[BoundingBox]) -> Vec<BoundingBox> {
    candidates
        .iter()
        .filter(|c| !eyes.iter().any(|eye| eye.intersects(c)))
        .copied()
        .collect()
}

/// Pick the candidate with the highest [`BoundingBox::corner_score`].
///
/// Only used when no face framed the search. Ties keep the earliest candidate.
pub fn largest_mouth_region(candidates: &[BoundingBox]) -> Option<BoundingBox> {
    let mut best: Option<BoundingBox> = None;
    let mut best_score = 0;
    for candidate in candidates {
        let score = candidate.corner_score();
        if score > best_score {
            best_score = score;
            best = Some(*candidate);
        }
    }
    best
}
