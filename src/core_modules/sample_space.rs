// THEORY:
// The `sample_space` module is the bridge between an image buffer and the
// clustering engine. It flattens a 2D image into a 1D sample array — either
// one gray level per pixel (the luminance view) or one RGB triple per pixel —
// in a single, fixed traversal order.
//
// Key architectural principles:
// 1.  **Index Alignment**: sample `i` always corresponds to the pixel the
//     traversal visited at step `i`. Extraction and output reconstruction use
//     the same row-major order (outer loop over rows, inner over columns), so
//     a cluster assignment array can be mapped straight back onto the image.
// 2.  **Pure Extraction**: no side effects and no retained state. A zero-pixel
//     image yields an empty sample array, not an error.

use crate::core_modules::pixel::pixel::Pixel;
use image::RgbImage;

/// A scalar luminance sample in [0, 255].
pub type GraySample = i32;
/// An RGB sample, each channel in [0, 255].
pub type RgbSample = [i32; 3];

/// Extracts one gray level per pixel, row-major.
pub fn luminance_levels(image: &RgbImage) -> Vec<u8> {
    image
        .pixels()
        .map(|p| Pixel::new(p.0[0], p.0[1], p.0[2]).luminance_level())
        .collect()
}

/// Extracts one scalar luminance sample per pixel, row-major.
pub fn luminance_samples(image: &RgbImage) -> Vec<GraySample> {
    luminance_levels(image)
        .into_iter()
        .map(GraySample::from)
        .collect()
}

/// Extracts one RGB sample per pixel, row-major.
pub fn rgb_samples(image: &RgbImage) -> Vec<RgbSample> {
    image
        .pixels()
        .map(|p| [p.0[0] as i32, p.0[1] as i32, p.0[2] as i32])
        .collect()
}
