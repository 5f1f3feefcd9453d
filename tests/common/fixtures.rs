//! Synthetic page builders shared by the integration tests.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as DrawRect;
use panelize::Rect;

pub const INK: Rgb<u8> = Rgb([0u8, 0u8, 0u8]);
pub const PAPER: Rgb<u8> = Rgb([255u8, 255u8, 255u8]);

pub fn white_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, PAPER)
}

/// Draw a hollow rectangular border of the given stroke thickness, growing
/// inward from `rect`.
pub fn draw_border(img: &mut RgbImage, rect: Rect, thickness: u32) {
    for t in 0..thickness {
        let inset = DrawRect::at((rect.x + t) as i32, (rect.y + t) as i32)
            .of_size(rect.width - 2 * t, rect.height - 2 * t);
        draw_hollow_rect_mut(img, inset, INK);
    }
}

/// Draw a solid ink blob covering `rect`.
pub fn draw_blob(img: &mut RgbImage, rect: Rect) {
    let r = DrawRect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height);
    draw_filled_rect_mut(img, r, INK);
}

/// A page with its own outer border plus three well-separated panel borders
/// in a 2x2-minus-one grid. Returns the page and the drawn panel rects.
pub fn three_panel_page() -> (DynamicImage, Vec<Rect>) {
    let mut img = white_page(500, 400);
    draw_border(&mut img, Rect::new(2, 2, 496, 396), 2);

    let panels = vec![
        Rect::new(20, 20, 200, 150),
        Rect::new(280, 20, 200, 150),
        Rect::new(20, 210, 200, 150),
    ];
    for panel in &panels {
        draw_border(&mut img, *panel, 3);
    }

    (DynamicImage::ImageRgb8(img), panels)
}

/// Assert two rects differ by at most `tol` pixels on every edge.
pub fn assert_rect_close(actual: Rect, expected: Rect, tol: u32) {
    let close = actual.x.abs_diff(expected.x) <= tol
        && actual.y.abs_diff(expected.y) <= tol
        && actual.width.abs_diff(expected.width) <= tol
        && actual.height.abs_diff(expected.height) <= tol;
    assert!(
        close,
        "expected {:?} within {}px of {:?}",
        actual, tol, expected
    );
}

/// Sort rects into a canonical order for set comparison.
pub fn sorted_rects(mut rects: Vec<Rect>) -> Vec<Rect> {
    rects.sort_by_key(|r| (r.y, r.x, r.width, r.height));
    rects
}
