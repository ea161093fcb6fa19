//! The edit bake pipeline: rotate, then crop, then filter.
//!
//! Order is a correctness contract (see [`crate::transform`]): the crop
//! rectangle is defined against post-rotation dimensions, so the crop
//! step always runs against the rotated image. A step failure aborts the
//! whole bake; no intermediate image survives a failed run.

use std::fmt;

use thiserror::Error;

use crate::decode::{resize_to_fit, CapturedImage, ResampleFilter};
use crate::filter::{apply_filter, FilterSpec};
use crate::geometry::CropRect;
use crate::transform::{apply_crop, apply_rotation, Rotation};

/// The three bake steps, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStep {
    Rotate,
    Crop,
    FilterBake,
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformStep::Rotate => write!(f, "rotate"),
            TransformStep::Crop => write!(f, "crop"),
            TransformStep::FilterBake => write!(f, "filter bake"),
        }
    }
}

/// Errors surfaced by the bake pipeline.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The source image's dimensions could not be read or do not match
    /// its pixel buffer.
    #[error("Failed to read source image dimensions")]
    DimensionRead,

    /// A pipeline step produced an invalid image.
    #[error("Transformation failed at {step} step: {reason}")]
    Step {
        /// Which step failed.
        step: TransformStep,
        reason: String,
    },

    /// The preview downscale failed.
    #[error("Preview downscale failed: {0}")]
    Downscale(String),
}

/// Bake an edit session's pending operations into a new image.
///
/// Steps run in fixed order, each skipped at its identity value:
/// 1. rotate (quarter turns)
/// 2. crop (pixel bounds from the *post-rotation* dimensions)
/// 3. filter blend at the stored intensity
///
/// When every step is skipped the input is returned unchanged (as a
/// copy). On error the caller's image is untouched and all intermediates
/// are dropped.
pub fn bake(
    image: &CapturedImage,
    rotation: Rotation,
    crop: &CropRect,
    filter: &FilterSpec,
) -> Result<CapturedImage, TransformError> {
    if image.is_empty() || !image.dimensions_consistent() {
        return Err(TransformError::DimensionRead);
    }

    // Identity session: nothing to do
    if rotation.is_identity() && crop.is_identity() && filter.is_identity() {
        return Ok(image.clone());
    }

    let rotated = apply_rotation(image, rotation);
    check_step(&rotated, TransformStep::Rotate)?;

    let cropped = apply_crop(&rotated, crop);
    check_step(&cropped, TransformStep::Crop)?;

    let mut output = cropped;
    if !filter.is_identity() {
        apply_filter(&mut output.pixels, filter);
        check_step(&output, TransformStep::FilterBake)?;
    }

    Ok(output)
}

/// Render a lower-fidelity preview of the current edit state.
///
/// The image is downscaled to fit `max_edge` first, then run through the
/// same three steps as [`bake`], so slider-driven updates stay cheap
/// while remaining visually consistent with the final bake.
pub fn render_preview(
    image: &CapturedImage,
    rotation: Rotation,
    crop: &CropRect,
    filter: &FilterSpec,
    max_edge: u32,
) -> Result<CapturedImage, TransformError> {
    if image.is_empty() || !image.dimensions_consistent() {
        return Err(TransformError::DimensionRead);
    }

    let small = resize_to_fit(image, max_edge, ResampleFilter::Bilinear)
        .map_err(|e| TransformError::Downscale(e.to_string()))?;

    bake(&small, rotation, crop, filter)
}

/// Validate a step's output before it feeds the next step.
fn check_step(image: &CapturedImage, step: TransformStep) -> Result<(), TransformError> {
    if image.is_empty() {
        return Err(TransformError::Step {
            step,
            reason: "produced an empty image".to_string(),
        });
    }
    if !image.dimensions_consistent() {
        return Err(TransformError::Step {
            step,
            reason: format!(
                "pixel buffer length {} does not match {}x{}",
                image.byte_size(),
                image.width,
                image.height
            ),
        });
    }
    Ok(())
}
