//! Color filters and intensity blending.
//!
//! Each filter is a fixed affine color transform (3x3 matrix plus bias).
//! The blend model is a componentwise mix between the source color and
//! the transformed color:
//!
//! ```text
//! output = source * (1 - intensity) + transform(source) * intensity
//! ```
//!
//! The same arithmetic backs both the live preview (run against a
//! downscaled image) and the full-resolution bake at apply time, so the
//! two stay visually consistent.

use serde::{Deserialize, Serialize};

/// The selectable color filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// No filter; the pipeline skips blending entirely.
    #[default]
    None,
    /// Luma-weighted desaturation.
    Grayscale,
    /// Classic warm sepia tone.
    Sepia,
    /// Faded vintage look: compressed channels with lifted floor.
    Vintage,
}

impl FilterKind {
    /// All selectable filters, in UI order.
    pub const ALL: [FilterKind; 4] = [
        FilterKind::None,
        FilterKind::Grayscale,
        FilterKind::Sepia,
        FilterKind::Vintage,
    ];

    /// Display label for filter pickers.
    pub fn label(self) -> &'static str {
        match self {
            FilterKind::None => "Original",
            FilterKind::Grayscale => "B&W",
            FilterKind::Sepia => "Sepia",
            FilterKind::Vintage => "Vintage",
        }
    }

    pub fn is_none(self) -> bool {
        self == FilterKind::None
    }

    /// The fixed color transform for this filter. `None` maps to the
    /// identity transform.
    pub fn transform(self) -> ColorTransform {
        match self {
            FilterKind::None => ColorTransform::IDENTITY,
            // Every output channel is Rec.601 luma
            FilterKind::Grayscale => ColorTransform {
                matrix: [
                    [0.299, 0.587, 0.114],
                    [0.299, 0.587, 0.114],
                    [0.299, 0.587, 0.114],
                ],
                bias: [0.0, 0.0, 0.0],
            },
            FilterKind::Sepia => ColorTransform {
                matrix: [
                    [0.393, 0.769, 0.189],
                    [0.349, 0.686, 0.168],
                    [0.272, 0.534, 0.131],
                ],
                bias: [0.0, 0.0, 0.0],
            },
            // Per-channel compression toward a lifted floor
            FilterKind::Vintage => ColorTransform {
                matrix: [[0.9, 0.0, 0.0], [0.0, 0.8, 0.0], [0.0, 0.0, 0.7]],
                bias: [0.1, 0.2, 0.3],
            },
        }
    }
}

/// An affine color transform over normalized RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    /// Row-major 3x3 channel mixing matrix.
    pub matrix: [[f32; 3]; 3],
    /// Per-channel constant offset.
    pub bias: [f32; 3],
}

impl ColorTransform {
    /// The identity transform (output equals input).
    pub const IDENTITY: ColorTransform = ColorTransform {
        matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        bias: [0.0, 0.0, 0.0],
    };

    /// Apply the transform to a normalized RGB color. The result is not
    /// clamped; blending and quantization handle that.
    #[inline]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let [r, g, b] = rgb;
        [
            self.matrix[0][0] * r + self.matrix[0][1] * g + self.matrix[0][2] * b + self.bias[0],
            self.matrix[1][0] * r + self.matrix[1][1] * g + self.matrix[1][2] * b + self.bias[1],
            self.matrix[2][0] * r + self.matrix[2][1] * g + self.matrix[2][2] * b + self.bias[2],
        ]
    }
}

/// A selected filter plus blend intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Which filter to apply.
    pub kind: FilterKind,
    /// Blend intensity in [0, 1]; ignored when `kind` is `None`.
    pub intensity: f32,
}

impl FilterSpec {
    /// Create a spec with the intensity clamped into [0, 1].
    pub fn new(kind: FilterKind, intensity: f32) -> Self {
        Self {
            kind,
            intensity: clamp_intensity(intensity),
        }
    }

    /// The no-filter spec at full intensity (matches a fresh session).
    pub fn identity() -> Self {
        Self {
            kind: FilterKind::None,
            intensity: 1.0,
        }
    }

    /// Whether baking this spec is a no-op. Only the kind matters: `None`
    /// is a no-op at every stored intensity.
    pub fn is_identity(&self) -> bool {
        self.kind.is_none()
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::identity()
    }
}

/// Clamp an intensity value into [0, 1]; NaN becomes 0.
#[inline]
fn clamp_intensity(intensity: f32) -> f32 {
    if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, 1.0)
    }
}

/// Blend a single normalized color with its transformed value.
///
/// Intensity is clamped defensively even though callers already constrain
/// it. `blend(c, t, 0) == c` and `blend(c, t, 1) == t(c)` hold exactly.
#[inline]
pub fn blend(source: [f32; 3], transform: &ColorTransform, intensity: f32) -> [f32; 3] {
    let i = clamp_intensity(intensity);
    let transformed = transform.apply(source);
    [
        source[0] * (1.0 - i) + transformed[0] * i,
        source[1] * (1.0 - i) + transformed[1] * i,
        source[2] * (1.0 - i) + transformed[2] * i,
    ]
}

/// Apply a filter spec to an image's pixel data in place.
///
/// For `FilterKind::None` this is an exact no-op for every intensity;
/// the stored intensity value is never consulted.
pub fn apply_filter(pixels: &mut [u8], spec: &FilterSpec) {
    if spec.is_identity() {
        return;
    }

    let transform = spec.kind.transform();
    let intensity = clamp_intensity(spec.intensity);

    for chunk in pixels.chunks_exact_mut(3) {
        let source = [
            chunk[0] as f32 / 255.0,
            chunk[1] as f32 / 255.0,
            chunk[2] as f32 / 255.0,
        ];

        let out = blend(source, &transform, intensity);

        chunk[0] = quantize(out[0]);
        chunk[1] = quantize(out[1]);
        chunk[2] = quantize(out[2]);
    }
}

/// Convert a normalized channel back to u8 with clamping.
#[inline]
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rgb_close(a: [f32; 3], b: [f32; 3]) {
        for i in 0..3 {
            assert!(
                (a[i] - b[i]).abs() < 1e-6,
                "channel {} differs: {:?} vs {:?}",
                i,
                a,
                b
            );
        }
    }

    #[test]
    fn test_identity_transform() {
        let c = [0.25, 0.5, 0.75];
        assert_rgb_close(ColorTransform::IDENTITY.apply(c), c);
    }

    #[test]
    fn test_blend_at_zero_is_source() {
        let c = [0.2, 0.4, 0.6];
        for kind in FilterKind::ALL {
            assert_rgb_close(blend(c, &kind.transform(), 0.0), c);
        }
    }

    #[test]
    fn test_blend_at_one_is_transform() {
        let c = [0.2, 0.4, 0.6];
        for kind in FilterKind::ALL {
            let t = kind.transform();
            assert_rgb_close(blend(c, &t, 1.0), t.apply(c));
        }
    }

    #[test]
    fn test_blend_clamps_intensity() {
        let c = [0.3, 0.3, 0.3];
        let t = FilterKind::Sepia.transform();
        assert_rgb_close(blend(c, &t, -5.0), blend(c, &t, 0.0));
        assert_rgb_close(blend(c, &t, 7.0), blend(c, &t, 1.0));
        assert_rgb_close(blend(c, &t, f32::NAN), blend(c, &t, 0.0));
    }

    #[test]
    fn test_grayscale_equalizes_channels() {
        let t = FilterKind::Grayscale.transform();
        let out = t.apply([0.8, 0.4, 0.1]);
        assert!((out[0] - out[1]).abs() < 1e-6);
        assert!((out[1] - out[2]).abs() < 1e-6);

        // Rec.601 luma of pure red
        let red = t.apply([1.0, 0.0, 0.0]);
        assert!((red[0] - 0.299).abs() < 1e-6);
    }

    #[test]
    fn test_sepia_known_values() {
        let t = FilterKind::Sepia.transform();
        let out = t.apply([1.0, 0.0, 0.0]);
        assert!((out[0] - 0.393).abs() < 1e-6);
        assert!((out[1] - 0.349).abs() < 1e-6);
        assert!((out[2] - 0.272).abs() < 1e-6);
    }

    #[test]
    fn test_vintage_lifts_floor() {
        let t = FilterKind::Vintage.transform();
        let out = t.apply([0.0, 0.0, 0.0]);
        assert_rgb_close(out, [0.1, 0.2, 0.3]);

        let white = t.apply([1.0, 1.0, 1.0]);
        assert_rgb_close(white, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_apply_filter_none_is_exact_noop() {
        let original: Vec<u8> = (0u8..=254).collect();
        // Every intensity, including out-of-range ones
        for intensity in [0.0, 0.33, 1.0, 42.0, -1.0, f32::NAN] {
            let mut pixels = original.clone();
            let spec = FilterSpec {
                kind: FilterKind::None,
                intensity,
            };
            apply_filter(&mut pixels, &spec);
            assert_eq!(pixels, original);
        }
    }

    #[test]
    fn test_apply_filter_zero_intensity_is_noop() {
        let original: Vec<u8> = (0u8..=254).collect();
        for kind in [FilterKind::Grayscale, FilterKind::Sepia, FilterKind::Vintage] {
            let mut pixels = original.clone();
            apply_filter(&mut pixels, &FilterSpec::new(kind, 0.0));
            assert_eq!(pixels, original, "{:?} at zero intensity", kind);
        }
    }

    #[test]
    fn test_apply_filter_grayscale_full() {
        let mut pixels = vec![200, 100, 50];
        apply_filter(&mut pixels, &FilterSpec::new(FilterKind::Grayscale, 1.0));

        // All channels collapse to luma
        assert_eq!(pixels[0], pixels[1]);
        assert_eq!(pixels[1], pixels[2]);
    }

    #[test]
    fn test_apply_filter_sepia_clamps_highlights() {
        // Sepia of white exceeds 1.0 per channel and must clamp at 255
        let mut pixels = vec![255, 255, 255];
        apply_filter(&mut pixels, &FilterSpec::new(FilterKind::Sepia, 1.0));
        assert_eq!(pixels[0], 255);
        assert_eq!(pixels[1], 255);
    }

    #[test]
    fn test_apply_filter_half_intensity_between_endpoints() {
        let source = vec![200u8, 100, 50];

        let mut full = source.clone();
        apply_filter(&mut full, &FilterSpec::new(FilterKind::Vintage, 1.0));

        let mut half = source.clone();
        apply_filter(&mut half, &FilterSpec::new(FilterKind::Vintage, 0.5));

        for i in 0..3 {
            let lo = source[i].min(full[i]);
            let hi = source[i].max(full[i]);
            assert!(
                half[i] >= lo && half[i] <= hi,
                "channel {} not between endpoints",
                i
            );
        }
    }

    #[test]
    fn test_filter_spec_new_clamps() {
        assert_eq!(FilterSpec::new(FilterKind::Sepia, 3.0).intensity, 1.0);
        assert_eq!(FilterSpec::new(FilterKind::Sepia, -3.0).intensity, 0.0);
        assert_eq!(FilterSpec::new(FilterKind::Sepia, f32::NAN).intensity, 0.0);
    }

    #[test]
    fn test_identity_spec() {
        let spec = FilterSpec::identity();
        assert!(spec.is_identity());
        assert_eq!(spec.intensity, 1.0);
        assert_eq!(FilterSpec::default(), spec);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FilterKind::None.label(), "Original");
        assert_eq!(FilterKind::Grayscale.label(), "B&W");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
