//! Random satellite-like images for demos and tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use landwatch_core::{ErosionLevel, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::preprocess::ImagePreprocessor;
use crate::training::ErosionItem;
use crate::{IMAGE_SIZE, NUM_EROSION_CLASSES};

/// PNG-encoded 224x224 RGB noise, channel values in 0..=254
pub fn create_synthetic_image(seed: u64) -> Result<Vec<u8>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let size = IMAGE_SIZE as u32;
    let image = RgbImage::from_fn(size, size, |_, _| {
        Rgb([
            rng.gen_range(0..255),
            rng.gen_range(0..255),
            rng.gen_range(0..255),
        ])
    });
    encode_png(image)
}

/// Labeled noise images, already preprocessed to `image_size`.
///
/// Labels cycle through the erosion classes. Each class gets a slightly
/// different mix of exposed soil (red-brown) and vegetation (green) so the
/// training loop has some signal to fit.
pub fn synthetic_erosion_dataset(
    num_samples: usize,
    image_size: usize,
    seed: u64,
) -> Result<Vec<ErosionItem>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let preprocessor = ImagePreprocessor::with_size(image_size);
    let side = image_size as u32;

    let items = (0..num_samples)
        .map(|i| {
            let label = i % NUM_EROSION_CLASSES;
            let soil = label as f64 / (NUM_EROSION_CLASSES - 1) as f64;
            let image = RgbImage::from_fn(side, side, |_, _| {
                let noise: f64 = rng.gen_range(-30.0..30.0);
                let red = 60.0 + 140.0 * soil + noise;
                let green = 200.0 - 120.0 * soil + noise;
                let blue = 50.0 + 40.0 * soil + noise;
                Rgb([clamp_channel(red), clamp_channel(green), clamp_channel(blue)])
            });

            let values = preprocessor.preprocess_image(&DynamicImage::ImageRgb8(image))?;
            Ok(ErosionItem::new(values, label))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Generated {} synthetic erosion images ({} classes: {:?})",
        items.len(),
        NUM_EROSION_CLASSES,
        ErosionLevel::ALL.map(ErosionLevel::name)
    );
    Ok(items)
}

fn clamp_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn encode_png(image: RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_image_decodes_at_full_size() {
        let bytes = create_synthetic_image(42).unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image.width(), 224);
        assert_eq!(image.height(), 224);
        assert!(image.to_rgb8().pixels().all(|p| p.0.iter().all(|&c| c < 255)));
    }

    #[test]
    fn test_synthetic_image_is_seeded() {
        assert_eq!(
            create_synthetic_image(1).unwrap(),
            create_synthetic_image(1).unwrap()
        );
        assert_ne!(
            create_synthetic_image(1).unwrap(),
            create_synthetic_image(2).unwrap()
        );
    }

    #[test]
    fn test_erosion_dataset_labels_and_shape() {
        let items = synthetic_erosion_dataset(12, 16, 42).unwrap();
        assert_eq!(items.len(), 12);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.label, i % 5);
            assert_eq!(item.image.len(), 3 * 16 * 16);
        }
    }
}
