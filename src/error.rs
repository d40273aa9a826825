//! Error types for the edgequake-docextract library.
//!
//! Every failure is an [`ExtractError`]. Each variant is tagged with an
//! [`ErrorKind`] so the HTTP layer can tell content the conversion engine
//! refused apart from failures on our side of the fence.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The submitted document was refused by the conversion engine.
    InputRejected,
    /// Anything else: engine unavailable, malformed engine output, I/O.
    Internal,
}

/// All errors returned by the edgequake-docextract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The conversion engine refused the document (not a PDF, corrupt, encrypted).
    #[error("Conversion failed for '{path}': {detail}")]
    InputRejected { path: PathBuf, detail: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The conversion engine could not be started or bound.
    #[error("Conversion engine '{engine}' is not available: {detail}")]
    EngineUnavailable { engine: String, detail: String },

    /// The conversion engine crashed or exited abnormally.
    #[error("Conversion engine '{engine}' failed: {detail}")]
    EngineFailed { engine: String, detail: String },

    /// The engine produced a document we could not decode.
    #[error("Malformed document from conversion engine: {0}")]
    MalformedDocument(String),

    // ── Document content errors ───────────────────────────────────────────
    /// A table or picture carries no provenance, so its page is unknown.
    #[error("Item '{self_ref}' has no provenance")]
    MissingProvenance { self_ref: String },

    /// A picture has neither embedded image data nor a croppable page image.
    #[error("Picture '{self_ref}' has no image data: {detail}")]
    PictureUnavailable { self_ref: String, detail: String },

    /// PNG encoding of an extracted picture failed.
    #[error("Image encoding failed for '{self_ref}': {source}")]
    ImageEncoding {
        self_ref: String,
        #[source]
        source: image::ImageError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a temporary file.
    #[error("Failed to write temporary file: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },

    /// Listener or socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::FileNotFound { .. } | ExtractError::InputRejected { .. } => {
                ErrorKind::InputRejected
            }
            _ => ErrorKind::Internal,
        }
    }

    /// True when the conversion engine refused the submitted content.
    pub fn is_input_rejected(&self) -> bool {
        self.kind() == ErrorKind::InputRejected
    }
}
