use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::BTreeMap;

use crate::models::Region;

/// Find connected foreground regions in a binary image and reduce each to
/// its bounding box and pixel count. Only whole components are reported, so
/// structure nested inside a component never produces a separate region.
///
/// Regions come back in label order, which is deterministic for a given
/// input; it carries no geometric meaning.
pub fn find_regions(binary: &GrayImage, min_area: u32) -> Vec<Region> {
    let labeled = connected_components(binary, Connectivity::Eight, Luma([0u8]));

    let mut regions: BTreeMap<u32, Region> = BTreeMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }

        regions
            .entry(label_val)
            .and_modify(|r| {
                r.min_x = r.min_x.min(x);
                r.min_y = r.min_y.min(y);
                r.max_x = r.max_x.max(x);
                r.max_y = r.max_y.max(y);
                r.pixel_count += 1;
            })
            .or_insert(Region {
                label: label_val,
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                pixel_count: 1,
            });
    }

    regions
        .into_values()
        .filter(|r| r.pixel_count >= min_area)
        .collect()
}
