//! Image cleanup ahead of local recognition.
//!
//! Phone photos of printed reports are usually small, low contrast, and in
//! color. Tesseract does noticeably better on a large grayscale image with
//! the full intensity range in use, so uploads are normalized to that before
//! being handed to the engine.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat};

use crate::error::{StewardError, StewardResult};

/// Target length of the shorter image side, in pixels.
pub const MIN_SHORT_SIDE: u32 = 1000;

/// Upscaling never grows the longer side past this many pixels.
pub const MAX_LONG_SIDE: u32 = 4000;

/// Decodes an uploaded PNG or JPEG and returns a cleaned-up grayscale PNG.
pub fn prepare_for_ocr(bytes: &[u8]) -> StewardResult<Vec<u8>> {
    let decoded = image::load_from_memory(bytes).map_err(|e| StewardError::InvalidImage {
        message: e.to_string(),
    })?;

    let gray = stretch_contrast(upscale(decoded.to_luma8()));

    let mut encoded = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .map_err(|e| StewardError::InvalidImage {
            message: format!("failed to encode preprocessed image: {}", e),
        })?;

    Ok(encoded)
}

/// Returns true when `bytes` starts with a PNG or JPEG signature.
pub fn is_supported_image(bytes: &[u8]) -> bool {
    matches!(
        image::guess_format(bytes),
        Ok(ImageFormat::Png) | Ok(ImageFormat::Jpeg)
    )
}

/// Enlarges small images toward [`MIN_SHORT_SIDE`], capped by [`MAX_LONG_SIDE`].
fn upscale(gray: GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let short_side = width.min(height);
    let long_side = width.max(height);
    if short_side == 0 || short_side >= MIN_SHORT_SIDE {
        return gray;
    }

    let scale = (f64::from(MIN_SHORT_SIDE) / f64::from(short_side))
        .min(f64::from(MAX_LONG_SIDE) / f64::from(long_side));
    if scale <= 1.0 {
        return gray;
    }

    let new_width = ((f64::from(width) * scale).round() as u32).max(1);
    let new_height = ((f64::from(height) * scale).round() as u32).max(1);
    image::imageops::resize(&gray, new_width, new_height, FilterType::Triangle)
}

/// Linearly maps the darkest pixel to 0 and the brightest to 255.
fn stretch_contrast(mut gray: GrayImage) -> GrayImage {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if max <= min {
        return gray;
    }

    let range = f32::from(max - min);
    for pixel in gray.pixels_mut() {
        let stretched = f32::from(pixel[0] - min) * 255.0 / range;
        pixel[0] = stretched.round() as u8;
    }
    gray
}
