//! Snapkit Core - Image processing library
//!
//! This crate provides the processing half of the photo capture & edit
//! pipeline: crop geometry, quarter-turn rotation, intensity-blended
//! color filters, JPEG decode/encode, and the ordered bake pipeline that
//! composes them. Everything here is pure and synchronous; session state
//! and I/O live in `snapkit-session`.

pub mod decode;
pub mod encode;
pub mod filter;
pub mod geometry;
pub mod pipeline;
pub mod transform;

pub use decode::{CapturedImage, DecodeError, Orientation, ResampleFilter};
pub use encode::{encode_jpeg, EncodeError};
pub use filter::{blend, ColorTransform, FilterKind, FilterSpec};
pub use geometry::{CropRect, PixelRect, Viewport};
pub use pipeline::{bake, render_preview, TransformError, TransformStep};
pub use transform::{apply_crop, apply_rotation, Rotation};
