//! Image decoding for Snapkit.
//!
//! This module provides:
//! - JPEG decoding with EXIF orientation correction (gallery imports)
//! - Image resizing for the live-preview path
//!
//! All operations are synchronous and allocation-bounded; callers that need
//! to stay off a UI thread wrap them in a blocking task.

mod jpeg;
mod resize;
mod types;

pub use jpeg::decode_jpeg;
pub use resize::{resize, resize_to_fit};
pub use types::{CapturedImage, DecodeError, Orientation, ResampleFilter};
