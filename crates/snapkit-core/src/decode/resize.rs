//! Image resizing for preview generation.
//!
//! The live-preview path downscales the working image before filtering so
//! slider updates stay cheap. All functions return new `CapturedImage`
//! instances without modifying the input.

use super::{CapturedImage, DecodeError, ResampleFilter};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if either target dimension is zero,
/// or `DecodeError::CorruptedFile` if the pixel buffer cannot be converted.
pub fn resize(
    image: &CapturedImage,
    width: u32,
    height: u32,
    filter: ResampleFilter,
) -> Result<CapturedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create RgbImage".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(CapturedImage::from_rgb_image(resized))
}

/// Resize an image to fit within a maximum edge length while preserving
/// aspect ratio.
///
/// If the image already fits, it is returned unchanged.
pub fn resize_to_fit(
    image: &CapturedImage,
    max_edge: u32,
    filter: ResampleFilter,
) -> Result<CapturedImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    let (src_width, src_height) = (image.width, image.height);

    if src_width <= max_edge && src_height <= max_edge {
        return Ok(image.clone());
    }

    let (new_width, new_height) = calculate_fit_dimensions(src_width, src_height, max_edge);

    resize(image, new_width, new_height, filter)
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        // Landscape or square: constrain by width
        let new_width = max_edge;
        let new_height = ((max_edge as f64 / ratio).round() as u32).max(1);
        (new_width, new_height)
    } else {
        // Portrait: constrain by height
        let new_height = max_edge;
        let new_width = ((max_edge as f64 * ratio).round() as u32).max(1);
        (new_width, new_height)
    }
}
