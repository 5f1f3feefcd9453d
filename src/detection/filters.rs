use crate::models::{Rect, Region};

/// Drop regions that span almost the full page in either dimension and
/// return the bounding rects of the survivors. A box covering the whole
/// image is the page's own border picked up as a component, not a panel.
pub fn filter_spanning(
    regions: &[Region],
    image_width: u32,
    image_height: u32,
    max_span_frac: f32,
) -> Vec<Rect> {
    regions
        .iter()
        .filter(|r| {
            r.width_frac(image_width) < max_span_frac
                && r.height_frac(image_height) < max_span_frac
        })
        .map(|r| r.bounding_rect())
        .collect()
}

/// Retention mask for de-nesting: `false` marks a rect fully contained in a
/// distinct other rect. Of two identical rects, exactly the earlier one is
/// retained.
pub fn denest_mask(rects: &[Rect]) -> Vec<bool> {
    rects
        .iter()
        .enumerate()
        .map(|(i, rect)| {
            !rects.iter().enumerate().any(|(j, other)| {
                j != i && other.contains(rect) && (!rect.contains(other) || j < i)
            })
        })
        .collect()
}

/// Remove every rect fully contained in a distinct other rect. Builds a
/// fresh retained list rather than splicing the input in place.
pub fn remove_nested(rects: &[Rect]) -> Vec<Rect> {
    let keep = denest_mask(rects);
    rects
        .iter()
        .zip(keep)
        .filter(|(_, k)| *k)
        .map(|(rect, _)| *rect)
        .collect()
}

/// Fuse rects whose padded boxes intersect into their unions, repeating
/// until a full pass finds no mergeable pair. Catches near-miss fragments
/// such as a word wrapped across two text blobs.
pub fn merge_overlapping(rects: Vec<Rect>, margin: u32) -> Vec<Rect> {
    let mut merged = rects;
    'scan: loop {
        for i in 0..merged.len() {
            for j in (i + 1)..merged.len() {
                if merged[i].padded(margin).intersects(&merged[j]) {
                    let fused = merged[i].union(&merged[j]);
                    merged.swap_remove(j);
                    merged[i] = fused;
                    continue 'scan;
                }
            }
        }
        break;
    }
    merged
}
