//! Image transformation operations: rotation and cropping.
//!
//! # Transform Order
//!
//! When an edit session is baked, transforms are applied in this order:
//! 1. Rotation (quarter turns)
//! 2. Crop (pixel bounds computed against the rotated image)
//! 3. Filter bake
//!
//! The order is a correctness contract: crop rectangles are defined
//! against post-rotation dimensions, so cropping first would cut the
//! wrong region whenever rotation is non-zero.
//!
//! # Coordinate System
//!
//! - Rotation is clockwise in 90 degree increments
//! - Crop coordinates are normalized (0.0 to 1.0) relative to image dimensions
//! - Origin is top-left corner

mod crop;
mod rotate;

pub use crop::apply_crop;
pub use rotate::{apply_rotation, rotated_bounds, Rotation};
