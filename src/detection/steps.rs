use anyhow::Result;
use image::GenericImageView;

use crate::detection::{filters, preprocessing, regions};
use crate::pipeline::{MetadataValue, PipelineContext, PipelineStep, StageData};

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: Vec<StageData>, _context: &PipelineContext) -> Result<Vec<StageData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = preprocessing::to_grayscale(&item.image);
            result.push(StageData {
                image: image::DynamicImage::ImageLuma8(gray),
                original: item.original.clone(),
                bbox: item.bbox,
                metadata: item.metadata.clone(),
            });
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Binarize with the inverted local-mean adaptive threshold
pub struct ThresholdStep {
    pub block_size: u32,
    pub block_offset: u8,
    pub fallback: u8,
}

impl PipelineStep for ThresholdStep {
    fn process(&self, data: Vec<StageData>, _context: &PipelineContext) -> Result<Vec<StageData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = item.image.to_luma8();
            let binary =
                preprocessing::threshold_inv(&gray, self.block_size, self.block_offset, self.fallback);
            result.push(StageData {
                image: image::DynamicImage::ImageLuma8(binary),
                original: item.original.clone(),
                bbox: item.bbox,
                metadata: item.metadata.clone(),
            });
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Adaptive Threshold"
    }
}

/// Grow foreground blobs so panel borders and lettering fuse into single
/// connected components
pub struct DilateStep {
    pub kernel_size: u32,
}

impl PipelineStep for DilateStep {
    fn process(&self, data: Vec<StageData>, _context: &PipelineContext) -> Result<Vec<StageData>> {
        let mut result = Vec::new();
        for item in data {
            let binary = item.image.to_luma8();
            let dilated = preprocessing::dilate_square(&binary, self.kernel_size);
            result.push(StageData {
                image: image::DynamicImage::ImageLuma8(dilated),
                original: item.original.clone(),
                bbox: item.bbox,
                metadata: item.metadata.clone(),
            });
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Dilation"
    }
}

/// Find connected regions in the binary page - splits one page into many
/// candidate items, each cropped from the original image
pub struct RegionSplitStep {
    pub min_area: u32,
}

impl PipelineStep for RegionSplitStep {
    fn process(&self, data: Vec<StageData>, _context: &PipelineContext) -> Result<Vec<StageData>> {
        let mut result = Vec::new();

        for item in data {
            let binary = item.image.to_luma8();
            let found = regions::find_regions(&binary, self.min_area);
            let (img_width, img_height) = item.original.as_ref().dimensions();

            // Each region becomes its own StageData
            for region in found {
                let bbox = region.bounding_rect();
                let cropped = item.original.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);

                let region_data =
                    StageData::from_region(cropped, item.original.clone(), bbox)
                        .with_metadata("pixel_count", MetadataValue::Int(region.pixel_count as i64))
                        .with_metadata(
                            "width_frac",
                            MetadataValue::Float(region.width_frac(img_width)),
                        )
                        .with_metadata(
                            "height_frac",
                            MetadataValue::Float(region.height_frac(img_height)),
                        );

                result.push(region_data);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Region Split"
    }
}

/// Reject candidates spanning almost the full page in either dimension
pub struct SpanFilterStep {
    pub max_span_frac: f32,
}

impl PipelineStep for SpanFilterStep {
    fn process(&self, data: Vec<StageData>, _context: &PipelineContext) -> Result<Vec<StageData>> {
        let mut result = Vec::new();

        for item in data {
            let width_frac = item.get_float("width_frac").unwrap_or(1.0);
            let height_frac = item.get_float("height_frac").unwrap_or(1.0);

            if width_frac < self.max_span_frac && height_frac < self.max_span_frac {
                result.push(item);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Span Filtering"
    }
}

/// Drop candidates whose box lies fully inside another candidate's box.
/// Works across the whole item set.
pub struct DenestStep;

impl PipelineStep for DenestStep {
    fn process(&self, data: Vec<StageData>, _context: &PipelineContext) -> Result<Vec<StageData>> {
        let rects = data
            .iter()
            .map(|item| {
                item.bbox
                    .ok_or_else(|| anyhow::anyhow!("Missing bbox on de-nest input"))
            })
            .collect::<Result<Vec<_>>>()?;

        let keep = filters::denest_mask(&rects);

        Ok(data
            .into_iter()
            .zip(keep)
            .filter(|(_, k)| *k)
            .map(|(item, _)| item)
            .collect())
    }

    fn name(&self) -> &str {
        "De-nesting"
    }
}

/// Fuse candidates whose padded boxes intersect into single items cropped at
/// the union box. Works across the whole item set.
pub struct MergeStep {
    pub margin: u32,
}

impl PipelineStep for MergeStep {
    fn process(&self, data: Vec<StageData>, _context: &PipelineContext) -> Result<Vec<StageData>> {
        let Some(first) = data.first() else {
            return Ok(vec![]);
        };
        let original = first.original.clone();
        let (img_width, img_height) = original.as_ref().dimensions();

        let rects = data
            .iter()
            .map(|item| {
                item.bbox
                    .ok_or_else(|| anyhow::anyhow!("Missing bbox on merge input"))
            })
            .collect::<Result<Vec<_>>>()?;

        let merged = filters::merge_overlapping(rects, self.margin);

        let mut result = Vec::new();
        for bbox in merged {
            let cropped = original.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);
            let item = StageData::from_region(cropped, original.clone(), bbox)
                .with_metadata(
                    "width_frac",
                    MetadataValue::Float(bbox.width as f32 / img_width as f32),
                )
                .with_metadata(
                    "height_frac",
                    MetadataValue::Float(bbox.height as f32 / img_height as f32),
                );
            result.push(item);
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Overlap Merging"
    }
}
