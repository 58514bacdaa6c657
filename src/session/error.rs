//! Rejections returned by the session controller.
//!
//! None of these are fatal. They come back to the caller as values and the
//! session is left exactly as it was.

use thiserror::Error;

/// Why a mode change was refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RejectionReason {
    /// Tracking needs a tag picked first.
    #[error("select a tag before starting to track")]
    NoTagSelected,

    /// Tracking needs a non-blank note.
    #[error("enter a note before starting to track")]
    NoNoteEntered,

    /// A break was declared without saying why.
    #[error("enter a reason for the break")]
    NoBreakReason,
}

/// The requested tag is not in the tag registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown tag '{0}'")]
pub struct InvalidTagError(pub String);
