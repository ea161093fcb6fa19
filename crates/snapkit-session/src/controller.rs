//! The capture & persistence controller.
//!
//! Owns the device, the store, and the session, and drives the full flow:
//! permission gate -> capture -> edit session -> bake -> persist ->
//! caller callback. The CPU-bound bake runs on a blocking worker so the
//! async caller is only suspended, never blocked.
//!
//! Liveness: an apply snapshot carries the session generation; the result
//! is persisted only if the session is still live when the bake lands. A
//! session closed mid-flight discards the result instead.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use snapkit_core::pipeline::{bake, TransformError};
use snapkit_core::CapturedImage;

use crate::capture::{import_photo, CameraDevice, CaptureError, PermissionState};
use crate::persist::{PersistError, PersistedPhoto, PhotoStore, Slot};
use crate::session::{ApplySnapshot, EditIntent, EditSession, SessionError, SessionState};
use crate::settings::SessionSettings;

/// Caller-supplied completion callback, invoked exactly once with the
/// final reference after persistence succeeds.
pub type CaptureCallback = Box<dyn FnOnce(&PersistedPhoto) + Send>;

/// The result of an apply that ran to completion.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The baked image was persisted and announced.
    Persisted(PersistedPhoto),
    /// The session was closed while the apply was in flight; the result
    /// was dropped without persisting.
    Discarded,
}

/// Errors surfaced by the apply/persist flow.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The session refused the transition.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The bake pipeline failed; the session is back in editing.
    #[error(transparent)]
    Transformation(#[from] TransformError),

    /// Persistence failed; the baked image is retained for retry.
    #[error(transparent)]
    Persistence(#[from] PersistError),

    /// The blocking bake task died.
    #[error("Background bake task failed: {0}")]
    Background(String),

    /// A retry was requested with no baked image waiting.
    #[error("No baked image awaiting persistence")]
    NothingPending,
}

/// A baked image waiting for (re-)persistence.
#[derive(Debug)]
struct PendingBake {
    image: CapturedImage,
    generation: u64,
}

/// Orchestrates one capture/edit/apply flow against a device and a store.
pub struct CaptureController<C: CameraDevice, S: PhotoStore> {
    device: Mutex<C>,
    store: S,
    session: Arc<Mutex<EditSession>>,
    settings: SessionSettings,
    slot: Slot,
    on_capture: StdMutex<Option<CaptureCallback>>,
    pending: Mutex<Option<PendingBake>>,
}

impl<C: CameraDevice, S: PhotoStore> CaptureController<C, S> {
    pub fn new(device: C, store: S, slot: Slot) -> Self {
        Self {
            device: Mutex::new(device),
            store,
            session: Arc::new(Mutex::new(EditSession::new())),
            settings: SessionSettings::default(),
            slot,
            on_capture: StdMutex::new(None),
            pending: Mutex::new(None),
        }
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Register the completion callback reported back to the initiating
    /// screen. Fired at most once, only after a successful persist.
    pub fn with_callback(self, callback: CaptureCallback) -> Self {
        *self
            .on_capture
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(callback);
        self
    }

    /// Handle to the shared session, for hosts that drive intents or need
    /// to close the session on navigation.
    pub fn session(&self) -> Arc<Mutex<EditSession>> {
        Arc::clone(&self.session)
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    /// Current camera permission, without prompting.
    pub async fn permission(&self) -> PermissionState {
        self.device.lock().await.permission()
    }

    /// Capture a photo from the device into the session.
    ///
    /// Denied permission fails before the device is touched and before
    /// the session leaves its current state.
    pub async fn capture(&self) -> Result<(), CaptureError> {
        let mut device = self.device.lock().await;

        let mut permission = device.permission();
        if permission == PermissionState::Undetermined {
            permission = device.request_permission().await;
        }
        if !permission.is_granted() {
            warn!("camera permission denied; capture not attempted");
            return Err(CaptureError::PermissionDenied);
        }

        self.session.lock().await.begin_capture()?;
        info!("capturing photo");

        match device.capture().await {
            Ok(photo) => {
                self.session.lock().await.finish_capture(photo)?;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "device capture failed");
                self.abort_capture_quietly().await;
                Err(e)
            }
        }
    }

    /// Bring a gallery-selected photo into the session.
    pub async fn import(&self, bytes: &[u8], reference: &str) -> Result<(), CaptureError> {
        self.session.lock().await.begin_capture()?;

        match import_photo(bytes, reference) {
            Ok(photo) => {
                self.session.lock().await.finish_capture(photo)?;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, reference, "gallery import failed");
                self.abort_capture_quietly().await;
                Err(e)
            }
        }
    }

    pub async fn begin_edit(&self) -> Result<(), SessionError> {
        self.session.lock().await.begin_edit()
    }

    /// Feed one edit intent to the session.
    pub async fn edit(&self, intent: EditIntent) -> Result<(), SessionError> {
        self.session.lock().await.handle(intent)
    }

    /// Render a live preview at the configured preview size.
    pub async fn preview(&self) -> Result<CapturedImage, SessionError> {
        self.session
            .lock()
            .await
            .preview(self.settings.preview_max_edge)
    }

    pub async fn cancel(&self) -> Result<(), SessionError> {
        self.session.lock().await.cancel()
    }

    /// Close the session (navigation away). Any in-flight apply result
    /// will be discarded instead of persisted.
    pub async fn close(&self) {
        self.session.lock().await.close();
        self.pending.lock().await.take();
    }

    /// Bake the pending edits and persist the result.
    ///
    /// Re-entrant calls are rejected while an apply is in flight. On
    /// pipeline failure the session returns to editing; on persistence
    /// failure the baked image is held for [`Self::retry_persist`].
    pub async fn apply(&self) -> Result<ApplyOutcome, ApplyError> {
        let snapshot = self.session.lock().await.begin_apply()?;
        let ApplySnapshot {
            photo,
            rotation,
            crop,
            filter,
            generation,
        } = snapshot;

        info!(
            reference = %photo.reference,
            rotation = rotation.degrees(),
            filter = ?filter.kind,
            "applying edits"
        );

        let image = photo.image;
        let baked =
            tokio::task::spawn_blocking(move || bake(&image, rotation, &crop, &filter)).await;

        let baked = match baked {
            Ok(Ok(img)) => img,
            Ok(Err(e)) => {
                warn!(error = %e, "bake failed; session stays editable");
                self.restore_editing().await;
                return Err(e.into());
            }
            Err(e) => {
                warn!(error = %e, "bake task failed");
                self.restore_editing().await;
                return Err(ApplyError::Background(e.to_string()));
            }
        };

        *self.pending.lock().await = Some(PendingBake {
            image: baked,
            generation,
        });
        self.persist_pending().await
    }

    /// Retry persistence of a baked image after a failed persist, without
    /// re-running the pipeline.
    pub async fn retry_persist(&self) -> Result<ApplyOutcome, ApplyError> {
        self.persist_pending().await
    }

    /// Drop a baked image that failed to persist and return the session
    /// to editing.
    pub async fn discard_pending(&self) -> Result<(), ApplyError> {
        if self.pending.lock().await.take().is_none() {
            return Err(ApplyError::NothingPending);
        }
        self.restore_editing().await;
        Ok(())
    }

    pub async fn has_pending(&self) -> bool {
        self.pending.lock().await.is_some()
    }

    async fn persist_pending(&self) -> Result<ApplyOutcome, ApplyError> {
        let mut pending_guard = self.pending.lock().await;
        let Some(pending) = pending_guard.as_ref() else {
            return Err(ApplyError::NothingPending);
        };
        let generation = pending.generation;

        // The session must still be live before anything is written
        if !self.session.lock().await.is_live(generation) {
            pending_guard.take();
            info!("session closed; baked image discarded without persisting");
            return Ok(ApplyOutcome::Discarded);
        }

        let persisted = match self
            .store
            .persist(&pending.image, &self.slot, self.settings.export_quality)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "persist failed; baked image retained for retry");
                return Err(e.into());
            }
        };

        // A close that landed during the write still discards the result
        {
            let mut session = self.session.lock().await;
            if !session.is_live(generation) {
                pending_guard.take();
                info!("session closed during persist; result discarded");
                return Ok(ApplyOutcome::Discarded);
            }
            session.finish_apply()?;
        }
        pending_guard.take();

        if let Some(callback) = self
            .on_capture
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            callback(&persisted);
        }

        info!(uri = %persisted.uri, "apply complete");
        Ok(ApplyOutcome::Persisted(persisted))
    }

    async fn abort_capture_quietly(&self) {
        if self.session.lock().await.abort_capture().is_err() {
            debug!("session was not capturing; nothing to abort");
        }
    }

    async fn restore_editing(&self) {
        if self.session.lock().await.fail_apply().is_err() {
            debug!("session no longer applying; state not restored");
        }
    }
}
