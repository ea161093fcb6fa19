//! Crop geometry: normalized rectangles, drag handling, pixel conversion.
//!
//! Crop regions are stored normalized (0.0 to 1.0) relative to whatever
//! image they are applied to, so a crop chosen against a preview viewport
//! stays correct when baked against the full-resolution image.
//!
//! # Coordinate System
//!
//! - (0.0, 0.0) = top-left corner
//! - (1.0, 1.0) = bottom-right corner
//! - width/height are fractions of the image dimensions
//!
//! Gesture input is inherently unbounded, so every operation here clamps
//! rather than rejects; none of these functions can fail or panic.

use serde::{Deserialize, Serialize};

/// Smallest representable crop dimension. Keeps degenerate rectangles out
/// of the data model; pixel conversion independently guarantees >= 1px.
const MIN_DIM: f64 = 1e-6;

/// A viewport in display pixels, used to normalize drag deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width in display pixels.
    pub width: f64,
    /// Viewport height in display pixels.
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A crop region in pixel coordinates, produced from a [`CropRect`] and a
/// concrete image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels (always >= 1).
    pub width: u32,
    /// Height in pixels (always >= 1).
    pub height: u32,
}

/// A normalized crop rectangle.
///
/// Invariants (maintained by every constructor and operation):
/// `0 <= x`, `0 <= y`, `x + width <= 1`, `y + height <= 1`,
/// `width > 0`, `height > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge (0.0 to 1.0).
    pub x: f64,
    /// Top edge (0.0 to 1.0).
    pub y: f64,
    /// Width as a fraction of image width.
    pub width: f64,
    /// Height as a fraction of image height.
    pub height: f64,
}

impl CropRect {
    /// The identity crop: the full image.
    pub const IDENTITY: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Build a rectangle from unclamped values, restoring the invariants.
    ///
    /// Sizes are clamped into `(0, 1]`, then the origin is clamped so the
    /// rectangle stays inside the unit square.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let width = sanitize(width).clamp(MIN_DIM, 1.0);
        let height = sanitize(height).clamp(MIN_DIM, 1.0);
        let x = sanitize(x).clamp(0.0, 1.0 - width);
        let y = sanitize(y).clamp(0.0, 1.0 - height);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if this is the identity crop (no-op).
    pub fn is_identity(&self) -> bool {
        self.x.abs() < f64::EPSILON
            && self.y.abs() < f64::EPSILON
            && (self.width - 1.0).abs() < f64::EPSILON
            && (self.height - 1.0).abs() < f64::EPSILON
    }

    /// Check the normalized-rectangle invariants.
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.0 + f64::EPSILON
            && self.y + self.height <= 1.0 + f64::EPSILON
    }

    /// Move the rectangle by a drag gesture measured in viewport pixels.
    ///
    /// The deltas are normalized against the viewport dimensions and the
    /// resulting origin is clamped to `[0, 1 - size]`, so the rectangle
    /// saturates at the image edge no matter how large the drag. The size
    /// is unchanged. A degenerate (non-positive) viewport axis contributes
    /// no offset on that axis.
    #[must_use]
    pub fn drag(&self, dx: f64, dy: f64, viewport: Viewport) -> CropRect {
        let ndx = if viewport.width > 0.0 {
            sanitize(dx) / viewport.width
        } else {
            0.0
        };
        let ndy = if viewport.height > 0.0 {
            sanitize(dy) / viewport.height
        } else {
            0.0
        };

        CropRect {
            x: (self.x + ndx).clamp(0.0, 1.0 - self.width),
            y: (self.y + ndy).clamp(0.0, 1.0 - self.height),
            width: self.width,
            height: self.height,
        }
    }

    /// Convert to pixel coordinates against a concrete image size.
    ///
    /// Each field is scaled and rounded half away from zero, then clamped
    /// so the region lies inside the image with at least a 1x1 output.
    /// Pure: identical inputs always produce identical output.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelRect {
        let src_w = image_width as f64;
        let src_h = image_height as f64;

        let px_x = (self.x.clamp(0.0, 1.0) * src_w).round() as u32;
        let px_y = (self.y.clamp(0.0, 1.0) * src_h).round() as u32;
        let px_w = (self.width.clamp(0.0, 1.0) * src_w).round() as u32;
        let px_h = (self.height.clamp(0.0, 1.0) * src_h).round() as u32;

        // Clamp to image bounds
        let px_x = px_x.min(image_width.saturating_sub(1));
        let px_y = px_y.min(image_height.saturating_sub(1));
        let right = (px_x + px_w).min(image_width);
        let bottom = (px_y + px_h).min(image_height);

        PixelRect {
            x: px_x,
            y: px_y,
            width: right.saturating_sub(px_x).max(1),
            height: bottom.saturating_sub(px_y).max(1),
        }
    }
}

impl Default for CropRect {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// NaN-proof a gesture value: NaN becomes 0, infinities saturate.
#[inline]
fn sanitize(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(f64::MIN, f64::MAX)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
