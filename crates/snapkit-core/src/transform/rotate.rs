//! Exact quarter-turn image rotation.
//!
//! Edit-session rotation advances in fixed 90 degree increments, so every
//! rotation is a lossless pixel permutation: no interpolation, no canvas
//! expansion, no resampling artifacts. 90 and 270 degree turns swap the
//! image dimensions.

use serde::{Deserialize, Serialize};

use crate::decode::CapturedImage;

/// A clockwise rotation in quarter turns. Only the four legal values are
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation.
    #[default]
    Deg0,
    /// 90 degrees clockwise.
    Deg90,
    /// 180 degrees.
    Deg180,
    /// 270 degrees clockwise.
    Deg270,
}

impl Rotation {
    /// Advance by a quarter turn: `(current + 90) mod 360`.
    #[must_use]
    pub fn next(self) -> Rotation {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// The rotation angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Parse a degree value; multiples of 360 are normalized first.
    /// Returns `None` for anything that is not a multiple of 90.
    pub fn from_degrees(degrees: u32) -> Option<Rotation> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Whether this rotation swaps width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Whether this is the no-op rotation.
    pub fn is_identity(self) -> bool {
        self == Rotation::Deg0
    }
}

/// Compute the output dimensions of a rotated image.
pub fn rotated_bounds(width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_dimensions() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Rotate an image clockwise by a quarter-turn multiple.
///
/// Produces a new `CapturedImage`; `Rotation::Deg0` returns a copy of the
/// input. The mapping is exact, so four 90 degree turns reproduce the
/// original buffer bit for bit.
pub fn apply_rotation(image: &CapturedImage, rotation: Rotation) -> CapturedImage {
    if rotation.is_identity() {
        return image.clone();
    }

    let (src_w, src_h) = (image.width, image.height);
    let (dst_w, dst_h) = rotated_bounds(src_w, src_h, rotation);

    let mut output = vec![0u8; (dst_w as usize) * (dst_h as usize) * 3];

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            // Inverse mapping: which source pixel lands here
            let (src_x, src_y) = match rotation {
                Rotation::Deg0 => (dst_x, dst_y),
                Rotation::Deg90 => (dst_y, src_h - 1 - dst_x),
                Rotation::Deg180 => (src_w - 1 - dst_x, src_h - 1 - dst_y),
                Rotation::Deg270 => (src_w - 1 - dst_y, dst_x),
            };

            let src_idx = ((src_y as usize) * (src_w as usize) + (src_x as usize)) * 3;
            let dst_idx = ((dst_y as usize) * (dst_w as usize) + (dst_x as usize)) * 3;

            output[dst_idx] = image.pixels[src_idx];
            output[dst_idx + 1] = image.pixels[src_idx + 1];
            output[dst_idx + 2] = image.pixels[src_idx + 2];
        }
    }

    CapturedImage {
        width: dst_w,
        height: dst_h,
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
    fn test_rotation_cycle() {
        // Four quarter turns return to the start
        let mut r = Rotation::Deg0;
        for _ in 0..4 {
            r = r.next();
        }
        assert_eq!(r, Rotation::Deg0);

        assert_eq!(Rotation::Deg0.next(), Rotation::Deg90);
        assert_eq!(Rotation::Deg270.next(), Rotation::Deg0);
    }

    #[test]
    fn test_degrees_round_trip() {
        for r in [
            Rotation::Deg0,
            Rotation::Deg90,
            Rotation::Deg180,
            Rotation::Deg270,
        ] {
            assert_eq!(Rotation::from_degrees(r.degrees()), Some(r));
        }
    }

    #[test]
    fn test_from_degrees_normalizes() {
        assert_eq!(Rotation::from_degrees(360), Some(Rotation::Deg0));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(720), Some(Rotation::Deg0));
    }

    #[test]
    fn test_from_degrees_rejects_off_axis() {
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::from_degrees(91), None);
    }

    #[test]
    fn test_swaps_dimensions() {
        assert!(!Rotation::Deg0.swaps_dimensions());
        assert!(Rotation::Deg90.swaps_dimensions());
        assert!(!Rotation::Deg180.swaps_dimensions());
        assert!(Rotation::Deg270.swaps_dimensions());
    }

    #[test]
    fn test_rotated_bounds() {
        assert_eq!(rotated_bounds(200, 100, Rotation::Deg0), (200, 100));
        assert_eq!(rotated_bounds(200, 100, Rotation::Deg90), (100, 200));
        assert_eq!(rotated_bounds(200, 100, Rotation::Deg180), (200, 100));
        assert_eq!(rotated_bounds(200, 100, Rotation::Deg270), (100, 200));
    }

    #[test]
    fn test_identity_rotation_is_copy() {
        let img = test_image(10, 6);
        let result = apply_rotation(&img, Rotation::Deg0);
        assert_eq!(result, img);
    }

    #[test]
    fn test_90_rotation_swaps_dims() {
        let img = test_image(10, 6);
        let result = apply_rotation(&img, Rotation::Deg90);
        assert_eq!(result.width, 6);
        assert_eq!(result.height, 10);
        assert!(result.dimensions_consistent());
    }

    #[test]
    fn test_90_rotation_pixel_mapping() {
        let img = test_image(3, 2);
        let result = apply_rotation(&img, Rotation::Deg90);

        // Clockwise: the source top-left corner lands in the top-right
        assert_eq!(result.rgb_at(1, 0), img.rgb_at(0, 0));
        // Source bottom-left lands in the top-left
        assert_eq!(result.rgb_at(0, 0), img.rgb_at(0, 1));
        // Source top-right lands in the bottom-right
        assert_eq!(result.rgb_at(1, 2), img.rgb_at(2, 0));
    }

    #[test]
    fn test_180_rotation_reverses() {
        let img = test_image(4, 3);
        let result = apply_rotation(&img, Rotation::Deg180);

        assert_eq!(result.width, 4);
        assert_eq!(result.height, 3);
        assert_eq!(result.rgb_at(0, 0), img.rgb_at(3, 2));
        assert_eq!(result.rgb_at(3, 2), img.rgb_at(0, 0));
    }

    #[test]
    fn test_270_rotation_pixel_mapping() {
        let img = test_image(3, 2);
        let result = apply_rotation(&img, Rotation::Deg270);

        // Counter-clockwise quarter turn: source top-right lands top-left
        assert_eq!(result.rgb_at(0, 0), img.rgb_at(2, 0));
        // Source top-left lands bottom-left
        assert_eq!(result.rgb_at(0, 2), img.rgb_at(0, 0));
    }

    #[test]
    fn test_four_quarter_turns_are_lossless() {
        let img = test_image(17, 11);
        let mut result = img.clone();
        for _ in 0..4 {
            result = apply_rotation(&result, Rotation::Deg90);
        }
        assert_eq!(result, img);
    }

    #[test]
    fn test_90_equals_270_reversed() {
        let img = test_image(8, 5);
        let cw = apply_rotation(&img, Rotation::Deg90);
        let back = apply_rotation(&cw, Rotation::Deg270);
        assert_eq!(back, img);
    }

    #[test]
    fn test_180_twice_is_identity() {
        let img = test_image(7, 7);
        let twice = apply_rotation(&apply_rotation(&img, Rotation::Deg180), Rotation::Deg180);
        assert_eq!(twice, img);
    }

    #[test]
    fn test_1x1_rotation() {
        let img = CapturedImage::new(1, 1, vec![9, 8, 7]);
        for r in [Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            let result = apply_rotation(&img, r);
            assert_eq!(result.pixels, img.pixels);
        }
    }

    #[test]
    fn test_thin_image_rotation() {
        let img = test_image(100, 1);
        let result = apply_rotation(&img, Rotation::Deg90);
        assert_eq!(result.width, 1);
        assert_eq!(result.height, 100);
    }
}
