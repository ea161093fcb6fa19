//! Camera permission/capture abstractions and gallery import.
//!
//! The actual camera hardware lives behind [`CameraDevice`] so the
//! session layer can be driven by any host (and by fakes in tests).
//! Gallery selection arrives as encoded bytes and is normalized into the
//! same [`CapturedPhoto`] shape as a device capture.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use snapkit_core::decode::{decode_jpeg, DecodeError};
use snapkit_core::CapturedImage;

/// The host permission state for camera access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// The user granted camera access.
    Granted,
    /// The user denied camera access; no capture call may be made.
    Denied,
    /// Not asked yet.
    #[default]
    Undetermined,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}

/// A photo as it enters the edit session: an opaque reference plus the
/// decoded pixels and their dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    /// Opaque reference to the photo (URI or host-assigned id).
    pub reference: String,
    /// The decoded image.
    pub image: CapturedImage,
}

/// Errors from the capture path.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Camera permission was denied; the device was not invoked.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// The device capture call failed.
    #[error("Device capture failed: {0}")]
    DeviceFailed(String),

    /// A gallery-selected file could not be decoded.
    #[error("Failed to decode selected photo: {0}")]
    Decode(#[from] DecodeError),

    /// The session refused the transition (programming error upstream).
    #[error(transparent)]
    Session(#[from] crate::session::SessionError),
}

/// A camera device as seen by the controller: permission lifecycle plus
/// a capture call producing a [`CapturedPhoto`].
#[allow(async_fn_in_trait)]
pub trait CameraDevice {
    /// Current permission state, without prompting.
    fn permission(&self) -> PermissionState;

    /// Prompt the user for camera access and return the resulting state.
    async fn request_permission(&mut self) -> PermissionState;

    /// Capture a photo from the device.
    async fn capture(&mut self) -> Result<CapturedPhoto, CaptureError>;
}

/// Decode a gallery-selected photo into a [`CapturedPhoto`].
///
/// JPEG bytes are decoded with EXIF orientation applied, so the session
/// always works with upright pixels.
pub fn import_photo(bytes: &[u8], reference: impl Into<String>) -> Result<CapturedPhoto, CaptureError> {
    let reference = reference.into();
    let image = decode_jpeg(bytes)?;
    debug!(reference = %reference, width = image.width, height = image.height,
           "imported gallery photo");
    Ok(CapturedPhoto { reference, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapkit_core::encode_jpeg;

    #[test]
    fn test_permission_default_undetermined() {
        assert_eq!(PermissionState::default(), PermissionState::Undetermined);
        assert!(!PermissionState::Undetermined.is_granted());
        assert!(PermissionState::Granted.is_granted());
    }

    #[test]
    fn test_import_photo_round_trip() {
        let image = CapturedImage::new(16, 8, vec![120u8; 16 * 8 * 3]);
        let bytes = encode_jpeg(&image, 95).unwrap();

        let photo = import_photo(&bytes, "file:///gallery/1.jpg").unwrap();
        assert_eq!(photo.reference, "file:///gallery/1.jpg");
        assert_eq!(photo.image.width, 16);
        assert_eq!(photo.image.height, 8);
    }

    #[test]
    fn test_import_photo_rejects_garbage() {
        let result = import_photo(&[1, 2, 3, 4], "file:///bad");
        assert!(matches!(result, Err(CaptureError::Decode(_))));
    }
}
