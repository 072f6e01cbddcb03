//! Pseudo-NDVI from visible bands.
//!
//! Satellite RGB has no near-infrared band, so green stands in for NIR:
//! `(g - r) / (g + r + eps)` per pixel, averaged over the full-resolution image.

use image::RgbImage;
use landwatch_core::{Error, Result};

const EPSILON: f64 = 1e-8;

/// Mean pseudo-NDVI of encoded image bytes, in [-1, 1]
pub fn pseudo_ndvi(bytes: &[u8]) -> Result<f64> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    pseudo_ndvi_rgb(&rgb)
}

pub fn pseudo_ndvi_rgb(rgb: &RgbImage) -> Result<f64> {
    let num_pixels = rgb.width() as usize * rgb.height() as usize;
    if num_pixels == 0 {
        return Err(Error::Image("cannot compute NDVI of an empty image".to_string()));
    }

    let sum: f64 = rgb
        .pixels()
        .map(|pixel| {
            let red = pixel[0] as f64;
            let green = pixel[1] as f64;
            (green - red) / (green + red + EPSILON)
        })
        .sum();

    Ok(sum / num_pixels as f64)
}
