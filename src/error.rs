//! Error handling for LSD decoding
//!
//! This module re-exports the error types used throughout the decoder.
//! The error enum itself lives in [`crate::common`] next to the format
//! constants its variants describe.

pub use crate::common::LsdError;
pub use crate::common::Result;
