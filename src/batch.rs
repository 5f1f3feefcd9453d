use image::DynamicImage;
use rayon::prelude::*;

use crate::detection::PanelDetector;
use crate::error::DetectionError;
use crate::models::Rect;

/// Run detection across pages on the rayon worker pool. Pages are
/// independent, so each worker operates on its own image with no shared
/// mutable state. Each page gets its own `Result` slot: one failed page
/// never aborts the others, and the caller decides whether to retry or
/// substitute an empty panel list.
pub fn detect_pages(
    images: &[DynamicImage],
    detector: &PanelDetector,
) -> Vec<Result<Vec<Rect>, DetectionError>> {
    images.par_iter().map(|img| detector.detect(img)).collect()
}
