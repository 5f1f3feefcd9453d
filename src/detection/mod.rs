pub mod filters;
pub mod params;
pub mod preprocessing;
pub mod regions;
pub mod steps;

use image::{DynamicImage, GrayImage};

use crate::error::DetectionError;
use crate::models::{Rect, Region};
pub use params::DetectionParams;

/// Panel detector: runs the full segmentation pipeline on one page image.
///
/// Detection is a pure, synchronous function of the image and the params;
/// two calls with the same inputs produce the same rectangle set. The output
/// carries no geometric ordering; callers wanting reading order sort by top
/// coordinate, then left.
pub struct PanelDetector {
    pub params: DetectionParams,
    pub verbose: bool,
}

impl PanelDetector {
    pub fn new() -> Self {
        Self {
            params: DetectionParams::default(),
            verbose: false,
        }
    }

    /// Build a detector with explicit tunables, validating them once up
    /// front. `detect` re-validates, so a detector whose pub fields were
    /// edited afterwards still fails loudly instead of clamping.
    pub fn with_params(params: DetectionParams) -> Result<Self, DetectionError> {
        params.validate()?;
        Ok(Self {
            params,
            verbose: false,
        })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run the full detection pipeline on a page image.
    ///
    /// Returns the de-nested, merged panel candidates in page-pixel
    /// coordinates. An empty result is a valid outcome, not an error.
    pub fn detect(&self, img: &DynamicImage) -> Result<Vec<Rect>, DetectionError> {
        self.params.validate()?;
        check_image(img)?;

        if self.verbose {
            println!("\nPreprocessing image...");
            println!("Converting to grayscale...");
        }
        let gray = preprocessing::to_grayscale(img);

        if self.verbose {
            println!("Applying adaptive threshold...");
        }
        let binary = preprocessing::threshold_inv(
            &gray,
            self.params.block_size,
            self.params.block_offset,
            self.params.threshold,
        );

        if self.verbose {
            println!("Dilating foreground...");
        }
        let dilated = preprocessing::dilate_square(&binary, self.params.dilation_kernel_size);

        if self.verbose {
            println!("\nExtracting regions...");
        }
        let found = regions::find_regions(&dilated, self.params.min_contour_area);

        if self.verbose {
            println!("Found {} regions above minimum area", found.len());
            for (i, region) in found.iter().take(10).enumerate() {
                println!(
                    "  Region {}: bbox={:?}, pixels={}",
                    i + 1,
                    region.bounding_rect(),
                    region.area()
                );
            }
        }

        let candidates =
            filters::filter_spanning(&found, img.width(), img.height(), self.params.max_span_frac);

        if self.verbose {
            println!(
                "Kept {} candidates after page-border rejection (from {} regions)",
                candidates.len(),
                found.len()
            );
        }

        let denested = filters::remove_nested(&candidates);

        if self.verbose {
            println!(
                "Kept {} panels after de-nesting (from {} candidates)",
                denested.len(),
                candidates.len()
            );
        }

        let panels = match self.params.merge_margin {
            Some(margin) => {
                let merged = filters::merge_overlapping(denested, margin);
                if self.verbose {
                    println!("Merged down to {} panels (margin {}px)", merged.len(), margin);
                }
                merged
            }
            None => denested,
        };

        Ok(panels)
    }

    /// Get the binarized, dilated image (for debugging)
    pub fn get_binary(&self, img: &DynamicImage) -> Result<GrayImage, DetectionError> {
        self.params.validate()?;
        check_image(img)?;
        let gray = preprocessing::to_grayscale(img);
        let binary = preprocessing::threshold_inv(
            &gray,
            self.params.block_size,
            self.params.block_offset,
            self.params.threshold,
        );
        Ok(preprocessing::dilate_square(&binary, self.params.dilation_kernel_size))
    }

    /// Get all regions above the area threshold (for debugging)
    pub fn get_regions(&self, img: &DynamicImage) -> Result<Vec<Region>, DetectionError> {
        let dilated = self.get_binary(img)?;
        Ok(regions::find_regions(&dilated, self.params.min_contour_area))
    }

    /// Get candidate rects before de-nesting and merging (for debugging)
    pub fn get_candidates(&self, img: &DynamicImage) -> Result<Vec<Rect>, DetectionError> {
        let found = self.get_regions(img)?;
        Ok(filters::filter_spanning(
            &found,
            img.width(),
            img.height(),
            self.params.max_span_frac,
        ))
    }
}

impl Default for PanelDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn check_image(img: &DynamicImage) -> Result<(), DetectionError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(DetectionError::InvalidImage(format!(
            "zero-dimension image ({}x{})",
            img.width(),
            img.height()
        )));
    }
    Ok(())
}

/// Build the standard detection pipeline from composable steps. Produces the
/// same rectangle set as [`PanelDetector::detect`], one stage per step, which
/// lets the debug mode dump every intermediate image.
pub fn build_standard_pipeline(
    params: &DetectionParams,
    verbose: bool,
) -> crate::pipeline::Pipeline {
    use crate::detection::steps::*;
    use crate::pipeline::Pipeline;
    use std::sync::Arc;

    let mut pipeline = Pipeline::new()
        .with_verbose(verbose)
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(ThresholdStep {
            block_size: params.block_size,
            block_offset: params.block_offset,
            fallback: params.threshold,
        }))
        .add_step(Arc::new(DilateStep {
            kernel_size: params.dilation_kernel_size,
        }))
        .add_step(Arc::new(RegionSplitStep {
            min_area: params.min_contour_area,
        }))
        .add_step(Arc::new(SpanFilterStep {
            max_span_frac: params.max_span_frac,
        }))
        .add_step(Arc::new(DenestStep));

    if let Some(margin) = params.merge_margin {
        pipeline = pipeline.add_step(Arc::new(MergeStep { margin }));
    }

    pipeline
}
