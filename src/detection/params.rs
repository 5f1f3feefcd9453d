use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// Tunables for the panel detection pipeline.
///
/// Two field sets have proven workable in practice: the defaults below, and
/// a coarser tuning (`dilation_kernel_size: 15`, `min_contour_area: 5000`,
/// `max_span_frac: 0.98`) that fuses whole text blocks into single blobs at
/// the cost of looser panel bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Global binarization cutoff, used only when the image is smaller than
    /// the adaptive block in either dimension.
    pub threshold: u8,
    /// Side of the square neighborhood for the local-mean threshold.
    /// Must be odd and at least 3.
    pub block_size: u32,
    /// Subtracted from the local mean before comparing; larger values keep
    /// only pixels clearly darker than their surroundings.
    pub block_offset: u8,
    /// Side of the square dilation structuring element. Must be positive;
    /// even values are rounded up to the next odd size.
    pub dilation_kernel_size: u32,
    /// Regions with fewer foreground pixels than this are noise, not panels.
    /// Must be positive.
    pub min_contour_area: u32,
    /// A candidate spanning at least this fraction of the image width or
    /// height is the page's own border, not a panel. Conventionally kept in
    /// the 0.95..0.99 band; any value in (0, 1) is accepted.
    pub max_span_frac: f32,
    /// Padding for the overlap-merge stage: candidates whose boxes come
    /// within this margin of each other are fused into their union.
    /// `None` disables merging.
    pub merge_margin: Option<u32>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            threshold: 127,
            block_size: 11,
            block_offset: 5,
            dilation_kernel_size: 5,
            min_contour_area: 1000,
            max_span_frac: 0.95,
            merge_margin: Some(10),
        }
    }
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(DetectionError::InvalidParameter(format!(
                "block_size must be odd and >= 3, got {}",
                self.block_size
            )));
        }
        if self.dilation_kernel_size == 0 || self.dilation_kernel_size > 511 {
            return Err(DetectionError::InvalidParameter(format!(
                "dilation_kernel_size must be in 1..=511, got {}",
                self.dilation_kernel_size
            )));
        }
        if self.min_contour_area == 0 {
            return Err(DetectionError::InvalidParameter(
                "min_contour_area must be positive".into(),
            ));
        }
        if !self.max_span_frac.is_finite()
            || self.max_span_frac <= 0.0
            || self.max_span_frac >= 1.0
        {
            return Err(DetectionError::InvalidParameter(format!(
                "max_span_frac must be within (0, 1), got {}",
                self.max_span_frac
            )));
        }
        Ok(())
    }
}
