use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::box_filter;
use imageproc::morphology::dilate;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Binarize with an inverted local-mean adaptive threshold: a pixel becomes
/// foreground (255) when it is at least `offset` darker than the mean of the
/// `block_size` x `block_size` neighborhood around it. Images smaller than
/// the block in either dimension fall back to a global cutoff at `fallback`.
pub fn threshold_inv(gray: &GrayImage, block_size: u32, offset: u8, fallback: u8) -> GrayImage {
    let (width, height) = gray.dimensions();

    if width < block_size || height < block_size {
        let mut out = GrayImage::new(width, height);
        for (x, y, pixel) in gray.enumerate_pixels() {
            let on = pixel[0] <= fallback;
            out.put_pixel(x, y, Luma([if on { 255 } else { 0 }]));
        }
        return out;
    }

    let radius = block_size / 2;
    let means = box_filter(gray, radius, radius);

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let cutoff = means.get_pixel(x, y)[0] as i32 - offset as i32;
        let on = (pixel[0] as i32) <= cutoff;
        out.put_pixel(x, y, Luma([if on { 255 } else { 0 }]));
    }
    out
}

/// Grow foreground regions with a square structuring element of side
/// `kernel_size` (one iteration). Even sizes round up to the next odd size;
/// size 1 is the identity.
pub fn dilate_square(binary: &GrayImage, kernel_size: u32) -> GrayImage {
    let radius = kernel_size / 2;
    if radius == 0 {
        return binary.clone();
    }
    dilate(binary, Norm::LInf, radius as u8)
}
