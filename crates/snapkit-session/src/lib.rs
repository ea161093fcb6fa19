//! Snapkit Session - capture and edit session layer
//!
//! This crate owns the stateful half of the photo capture & edit
//! pipeline:
//!
//! - `session` - the edit session state machine and its intent messages
//! - `capture` - camera permission/capture abstractions and gallery import
//! - `persist` - photo stores with mirrored-slot writes
//! - `controller` - the capture & persistence controller tying it together
//! - `settings` - session tunables and injected render preferences
//!
//! The pure image processing lives in `snapkit-core`; this crate drives
//! it asynchronously (tokio) and never blocks the caller on CPU work.

pub mod capture;
pub mod controller;
pub mod persist;
pub mod session;
pub mod settings;

pub use capture::{import_photo, CameraDevice, CaptureError, CapturedPhoto, PermissionState};
pub use controller::{ApplyError, ApplyOutcome, CaptureCallback, CaptureController};
pub use persist::{FsPhotoStore, MemoryPhotoStore, PersistError, PersistedPhoto, PhotoStore, Slot};
pub use session::{ApplySnapshot, EditIntent, EditSession, SessionError, SessionState};
pub use settings::{RenderPrefs, SessionSettings, SettingsError};
