//! Image preprocessing shared by both image models.
//!
//! Decode, convert to RGB, resize to a square (bicubic), scale to [0, 1],
//! normalize per channel with ImageNet statistics, lay out as CHW.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::{imageops::FilterType, DynamicImage, RgbImage};
use landwatch_core::{Error, ImageDimensions, Result};

use crate::IMAGE_SIZE;

/// ImageNet normalization mean values (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    size: u32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePreprocessor {
    /// 224x224 output
    pub fn new() -> Self {
        Self {
            size: IMAGE_SIZE as u32,
        }
    }

    /// Square output of `size` pixels per side
    pub fn with_size(size: usize) -> Self {
        Self { size: size as u32 }
    }

    pub fn output_dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.size, self.size, 3)
    }

    /// `[1, 3, size, size]`
    pub fn tensor_shape(&self) -> [usize; 4] {
        let size = self.size as usize;
        [1, 3, size, size]
    }

    /// Decodes encoded image bytes (PNG, JPEG, ...) and preprocesses them
    pub fn preprocess_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let image = image::load_from_memory(bytes)?;
        self.preprocess_image(&image)
    }

    /// Returns `3 * size * size` values in CHW order
    pub fn preprocess_image(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::Image("image has zero width or height".to_string()));
        }

        let rgb = image
            .resize_exact(self.size, self.size, FilterType::CatmullRom)
            .to_rgb8();
        Ok(normalize_chw(&rgb))
    }

    /// Builds a `[1, 3, size, size]` tensor from preprocessed values
    pub fn to_tensor<B: Backend>(&self, values: Vec<f32>, device: &B::Device) -> Result<Tensor<B, 4>> {
        let shape = self.tensor_shape();
        let expected = self.output_dimensions().total_values();
        if values.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "expected {} values for shape {:?}, got {}",
                expected,
                shape,
                values.len()
            )));
        }

        Ok(Tensor::<B, 4>::from_floats(TensorData::new(values, shape), device))
    }

    /// Decode, preprocess and upload in one step
    pub fn bytes_to_tensor<B: Backend>(&self, bytes: &[u8], device: &B::Device) -> Result<Tensor<B, 4>> {
        let values = self.preprocess_bytes(bytes)?;
        self.to_tensor(values, device)
    }
}

/// CHW layout: all R values, then all G values, then all B values
fn normalize_chw(rgb: &RgbImage) -> Vec<f32> {
    let (width, height) = rgb.dimensions();
    let num_pixels = (width * height) as usize;
    let mut normalized = vec![0.0f32; 3 * num_pixels];

    for (i, pixel) in rgb.pixels().enumerate() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            normalized[c * num_pixels + i] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::{ImageBuffer, ImageFormat, Rgb, Rgba};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_output_length_independent_of_input_size() {
        let preprocessor = ImagePreprocessor::new();
        for (w, h) in [(10, 10), (300, 120), (224, 224), (1, 500)] {
            let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(w, h, Rgb([10, 20, 30])));
            let values = preprocessor.preprocess_image(&img).unwrap();
            assert_eq!(values.len(), 3 * 224 * 224);
        }
    }

    #[test]
    fn test_normalization_values() {
        let preprocessor = ImagePreprocessor::with_size(4);
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(8, 8, Rgb([255, 0, 128])));
        let values = preprocessor.preprocess_image(&img).unwrap();

        let r = (1.0 - 0.485) / 0.229;
        let g = (0.0 - 0.456) / 0.224;
        let b = (128.0 / 255.0 - 0.406) / 0.225;
        assert!((values[0] - r).abs() < 1e-5);
        assert!((values[16] - g).abs() < 1e-5);
        assert!((values[32] - b).abs() < 1e-5);
    }

    #[test]
    fn test_rgba_and_gray_inputs() {
        let preprocessor = ImagePreprocessor::with_size(8);
        let rgba = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(5, 7, Rgba([1, 2, 3, 4])));
        let gray = DynamicImage::new_luma8(12, 3);

        assert_eq!(preprocessor.preprocess_bytes(&png_bytes(rgba)).unwrap().len(), 192);
        assert_eq!(preprocessor.preprocess_bytes(&png_bytes(gray)).unwrap().len(), 192);
    }

    #[test]
    fn test_invalid_bytes() {
        let preprocessor = ImagePreprocessor::new();
        let result = preprocessor.preprocess_bytes(b"definitely not an image");
        assert!(matches!(result, Err(Error::Image(_))));
    }

    #[test]
    fn test_to_tensor_shape() {
        let device = Default::default();
        let preprocessor = ImagePreprocessor::with_size(6);
        let img = DynamicImage::new_rgb8(20, 20);
        let tensor = preprocessor
            .bytes_to_tensor::<NdArray>(&png_bytes(img), &device)
            .unwrap();
        assert_eq!(tensor.dims(), [1, 3, 6, 6]);
        assert_eq!(preprocessor.output_dimensions(), ImageDimensions::new(6, 6, 3));

        let wrong = preprocessor.to_tensor::<NdArray>(vec![0.0; 10], &device);
        assert!(matches!(wrong, Err(Error::InvalidArgument(_))));
    }
}
