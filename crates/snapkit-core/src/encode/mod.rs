//! Image encoding for persistence.

mod jpeg;

pub use jpeg::{encode_jpeg, EncodeError};
