//! The edit session state machine.
//!
//! A session owns one captured photo and the pending edit state (rotation,
//! crop, filter). Hosts drive it with [`EditIntent`] messages; the
//! controller drives the capture/apply transitions. Every transition is
//! checked against the current state and illegal calls fail loudly with
//! [`SessionError::InvalidTransition`] without touching the session.
//!
//! ```text
//! Idle -> Capturing -> Captured -> Editing -> Applying -> Applied
//!              |            ^          |  ^        |
//!              +-> Idle     +- cancel -+  +- fail -+
//! ```

use std::fmt;

use thiserror::Error;
use tracing::debug;

use snapkit_core::pipeline::{render_preview, TransformError};
use snapkit_core::{CapturedImage, CropRect, FilterKind, FilterSpec, Rotation, Viewport};

use crate::capture::CapturedPhoto;

/// The lifecycle states of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No photo yet.
    Idle,
    /// A device capture or gallery import is in flight.
    Capturing,
    /// A photo is held, not being edited.
    Captured,
    /// Edit intents are accepted.
    Editing,
    /// The bake pipeline is running; no new apply is accepted.
    Applying,
    /// Terminal: the result was handed to persistence.
    Applied,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Capturing => "capturing",
            SessionState::Captured => "captured",
            SessionState::Editing => "editing",
            SessionState::Applying => "applying",
            SessionState::Applied => "applied",
        };
        write!(f, "{name}")
    }
}

/// A user-originated edit message, consumed synchronously by the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditIntent {
    /// Advance rotation by a quarter turn.
    Rotate,
    /// Move the crop rectangle by a drag gesture in viewport pixels.
    DragCrop { dx: f64, dy: f64, viewport: Viewport },
    /// Select a color filter.
    SelectFilter(FilterKind),
    /// Change the filter blend intensity (clamped to [0, 1]).
    SetIntensity(f32),
    /// Restore rotation, crop, and filter to identity.
    Reset,
}

impl EditIntent {
    fn name(&self) -> &'static str {
        match self {
            EditIntent::Rotate => "rotate",
            EditIntent::DragCrop { .. } => "drag-crop",
            EditIntent::SelectFilter(_) => "select-filter",
            EditIntent::SetIntensity(_) => "set-intensity",
            EditIntent::Reset => "reset",
        }
    }
}

/// Errors surfaced by session transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The call is not legal in the session's current state. This is a
    /// programming error in the caller; the session is left untouched.
    #[error("Invalid transition: {event} is not legal in the {state} state")]
    InvalidTransition {
        state: SessionState,
        event: &'static str,
    },

    /// A second apply was requested while one is in flight; it is
    /// rejected, not queued.
    #[error("An apply is already in flight")]
    ApplyInFlight,

    /// The session was closed (navigated away).
    #[error("The session is closed")]
    Closed,

    /// Preview rendering failed.
    #[error(transparent)]
    Preview(#[from] TransformError),
}

/// An owned snapshot of everything the bake pipeline needs, taken when an
/// apply begins. The generation ties the eventual result back to the
/// session so stale results can be discarded.
#[derive(Debug, Clone)]
pub struct ApplySnapshot {
    pub photo: CapturedPhoto,
    pub rotation: Rotation,
    pub crop: CropRect,
    pub filter: FilterSpec,
    pub generation: u64,
}

/// The edit session: one photo, the pending edits, and the state machine
/// that guards them.
#[derive(Debug)]
pub struct EditSession {
    state: SessionState,
    photo: Option<CapturedPhoto>,
    rotation: Rotation,
    crop: CropRect,
    filter: FilterSpec,
    dirty: bool,
    generation: u64,
    closed: bool,
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            photo: None,
            rotation: Rotation::Deg0,
            crop: CropRect::IDENTITY,
            filter: FilterSpec::identity(),
            dirty: false,
            generation: 0,
            closed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn photo(&self) -> Option<&CapturedPhoto> {
        self.photo.as_ref()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn crop(&self) -> CropRect {
        self.crop
    }

    pub fn filter(&self) -> FilterSpec {
        self.filter
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a result produced against `generation` may still be used.
    pub fn is_live(&self, generation: u64) -> bool {
        !self.closed && self.generation == generation
    }

    /// Start a capture. Legal from `Idle` and `Captured` (re-capture).
    pub fn begin_capture(&mut self) -> Result<(), SessionError> {
        self.check_open("begin-capture")?;
        match self.state {
            SessionState::Idle | SessionState::Captured => {
                self.state = SessionState::Capturing;
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                state,
                event: "begin-capture",
            }),
        }
    }

    /// Store a freshly captured photo and reset all edit fields.
    pub fn finish_capture(&mut self, photo: CapturedPhoto) -> Result<(), SessionError> {
        self.check_open("finish-capture")?;
        match self.state {
            SessionState::Capturing => {
                debug!(reference = %photo.reference, width = photo.image.width,
                       height = photo.image.height, "capture complete");
                self.photo = Some(photo);
                self.reset_edits();
                self.state = SessionState::Captured;
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                state,
                event: "finish-capture",
            }),
        }
    }

    /// Abort a failed capture. Falls back to the previous photo when one
    /// exists, otherwise to `Idle`.
    pub fn abort_capture(&mut self) -> Result<(), SessionError> {
        self.check_open("abort-capture")?;
        match self.state {
            SessionState::Capturing => {
                self.state = if self.photo.is_some() {
                    SessionState::Captured
                } else {
                    SessionState::Idle
                };
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                state,
                event: "abort-capture",
            }),
        }
    }

    /// Enter the editing state.
    pub fn begin_edit(&mut self) -> Result<(), SessionError> {
        self.check_open("begin-edit")?;
        match self.state {
            SessionState::Captured => {
                self.state = SessionState::Editing;
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                state,
                event: "begin-edit",
            }),
        }
    }

    /// Consume one edit intent. Legal only in `Editing`; each intent
    /// updates exactly one field.
    pub fn handle(&mut self, intent: EditIntent) -> Result<(), SessionError> {
        self.check_open(intent.name())?;
        if self.state != SessionState::Editing {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                event: intent.name(),
            });
        }

        match intent {
            EditIntent::Rotate => {
                self.rotation = self.rotation.next();
                self.dirty = true;
            }
            EditIntent::DragCrop { dx, dy, viewport } => {
                self.crop = self.crop.drag(dx, dy, viewport);
                self.dirty = true;
            }
            EditIntent::SelectFilter(kind) => {
                self.filter = FilterSpec::new(kind, self.filter.intensity);
                self.dirty = true;
            }
            EditIntent::SetIntensity(value) => {
                self.filter = FilterSpec::new(self.filter.kind, value);
                self.dirty = true;
            }
            EditIntent::Reset => {
                self.reset_edits();
            }
        }
        Ok(())
    }

    /// Render a downscaled preview of the current edit state.
    pub fn preview(&self, max_edge: u32) -> Result<CapturedImage, SessionError> {
        if self.state != SessionState::Editing {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                event: "preview",
            });
        }
        let photo = self.require_photo("preview")?;
        let image = render_preview(
            &photo.image,
            self.rotation,
            &self.crop,
            &self.filter,
            max_edge,
        )?;
        Ok(image)
    }

    /// Discard pending edits and return to `Captured`. The photo is kept.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.check_open("cancel")?;
        match self.state {
            SessionState::Editing => {
                self.reset_edits();
                self.state = SessionState::Captured;
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                state,
                event: "cancel",
            }),
        }
    }

    /// Move to `Applying` and hand back an owned snapshot for the bake.
    /// A second call while `Applying` is rejected with `ApplyInFlight`.
    pub fn begin_apply(&mut self) -> Result<ApplySnapshot, SessionError> {
        self.check_open("begin-apply")?;
        match self.state {
            SessionState::Applying => Err(SessionError::ApplyInFlight),
            SessionState::Editing => {
                let photo = self.require_photo("begin-apply")?.clone();
                self.state = SessionState::Applying;
                Ok(ApplySnapshot {
                    photo,
                    rotation: self.rotation,
                    crop: self.crop,
                    filter: self.filter,
                    generation: self.generation,
                })
            }
            state => Err(SessionError::InvalidTransition {
                state,
                event: "begin-apply",
            }),
        }
    }

    /// Record a successful apply. Terminal.
    pub fn finish_apply(&mut self) -> Result<(), SessionError> {
        self.check_open("finish-apply")?;
        match self.state {
            SessionState::Applying => {
                self.state = SessionState::Applied;
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                state,
                event: "finish-apply",
            }),
        }
    }

    /// Return to `Editing` after a failed apply; the session stays fully
    /// editable and the photo is unchanged.
    pub fn fail_apply(&mut self) -> Result<(), SessionError> {
        self.check_open("fail-apply")?;
        match self.state {
            SessionState::Applying => {
                self.state = SessionState::Editing;
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                state,
                event: "fail-apply",
            }),
        }
    }

    /// Close the session (navigated away). In-flight results become
    /// stale: `is_live` returns false for every prior generation.
    pub fn close(&mut self) {
        debug!(state = %self.state, "session closed");
        self.closed = true;
        self.generation = self.generation.wrapping_add(1);
    }

    fn reset_edits(&mut self) {
        self.rotation = Rotation::Deg0;
        self.crop = CropRect::IDENTITY;
        self.filter = FilterSpec::identity();
        self.dirty = false;
    }

    fn check_open(&self, event: &'static str) -> Result<(), SessionError> {
        if self.closed {
            debug!(event, "call on closed session");
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn require_photo(&self, event: &'static str) -> Result<&CapturedPhoto, SessionError> {
        self.photo.as_ref().ok_or(SessionError::InvalidTransition {
            state: self.state,
            event,
        })
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
