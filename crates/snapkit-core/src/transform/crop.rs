//! Image cropping using normalized coordinates.
//!
//! The crop region arrives as a [`CropRect`] normalized against whatever
//! image it is applied to. Pixel bounds are computed here, against this
//! image's dimensions; in the edit pipeline that is always the
//! post-rotation image.

use crate::decode::CapturedImage;
use crate::geometry::CropRect;

/// Apply a normalized crop to an image.
///
/// Returns a new `CapturedImage` containing only the cropped region.
/// The identity rect returns a copy of the original; out-of-range values
/// are clamped by the pixel conversion, and the output is never smaller
/// than 1x1.
pub fn apply_crop(image: &CapturedImage, rect: &CropRect) -> CapturedImage {
    // Fast path: full crop returns a clone
    if rect.is_identity() {
        return image.clone();
    }

    let px = rect.to_pixels(image.width, image.height);

    let mut output = vec![0u8; (px.width as usize) * (px.height as usize) * 3];

    // Copy pixel data row by row
    for y in 0..px.height {
        let src_y = px.y + y;
        let src_row_start = ((src_y * image.width + px.x) * 3) as usize;
        let dst_row_start = ((y * px.width) * 3) as usize;
        let row_bytes = (px.width * 3) as usize;

        output[dst_row_start..dst_row_start + row_bytes]
            .copy_from_slice(&image.pixels[src_row_start..src_row_start + row_bytes]);
    }

    CapturedImage {
        width: px.width,
        height: px.height,
        pixels: output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image where each pixel has a unique value based on position.
    fn test_image(width: u32, height: u32) -> CapturedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.push(v);
                pixels.push(v);
                pixels.push(v);
            }
        }
        CapturedImage {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_identity_crop_is_copy() {
        let img = test_image(50, 50);
        let result = apply_crop(&img, &CropRect::IDENTITY);

        assert_eq!(result, img);
    }

    #[test]
    fn test_half_crop() {
        let img = test_image(100, 100);
        let result = apply_crop(&img, &CropRect::new(0.0, 0.0, 0.5, 0.5));

        assert_eq!(result.width, 50);
        assert_eq!(result.height, 50);
    }

    #[test]
    fn test_center_crop_pixel_values() {
        let img = test_image(10, 10);
        let result = apply_crop(&img, &CropRect::new(0.2, 0.2, 0.6, 0.6));

        // 0.2 * 10 = 2, 0.6 * 10 = 6
        assert_eq!(result.width, 6);
        assert_eq!(result.height, 6);

        // First pixel comes from (2, 2): value (2 * 10 + 2) % 256 = 22
        assert_eq!(result.pixels[0], 22);
    }

    #[test]
    fn test_crop_offset_origin() {
        let img = test_image(10, 10);
        let result = apply_crop(&img, &CropRect::new(0.3, 0.3, 0.4, 0.4));

        // First pixel comes from (3, 3): value 33
        assert_eq!(result.rgb_at(0, 0), [33, 33, 33]);
    }

    #[test]
    fn test_crop_rectangular_strip() {
        let img = test_image(200, 100);
        let result = apply_crop(&img, &CropRect::new(0.0, 0.0, 0.25, 1.0));

        assert_eq!(result.width, 50);
        assert_eq!(result.height, 100);
    }

    #[test]
    fn test_crop_tiny_region_min_1x1() {
        let img = test_image(100, 100);
        let result = apply_crop(&img, &CropRect::new(0.99, 0.99, 0.001, 0.001));

        assert!(result.width >= 1);
        assert!(result.height >= 1);
        assert!(result.dimensions_consistent());
    }

    #[test]
    fn test_crop_small_image() {
        let img = test_image(4, 4);
        let result = apply_crop(&img, &CropRect::new(0.25, 0.25, 0.5, 0.5));

        assert!(result.width >= 1);
        assert!(result.height >= 1);
    }

    #[test]
    fn test_sequential_crops_compose() {
        let img = test_image(40, 40);

        let crop1 = apply_crop(&img, &CropRect::new(0.25, 0.25, 0.5, 0.5));
        let crop2 = apply_crop(&crop1, &CropRect::new(0.25, 0.25, 0.5, 0.5));

        // ~25% of the original in each dimension
        assert_eq!(crop2.width, 10);
        assert_eq!(crop2.height, 10);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
