#![forbid(unsafe_code)]

use thiserror::Error;

use crate::MediaKind;

/// Failure of the retrieval collaborator or of a raw stream capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("retrieval failed: {0}")]
    Failed(String),

    #[error("raw stream unavailable for {0}")]
    Unavailable(String),
}

/// Failure to acquire a decrypted stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptError {
    #[error("key not found")]
    KeyNotFound,

    #[error("decryption failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Source(#[from] RetrievalError),
}

/// Failure inside the rendering engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("no renderer for {kind} media ({name})")]
    Unsupported { kind: MediaKind, name: String },

    #[error("media stream failed: {0}")]
    Stream(String),

    #[error("render failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session id must not be empty")]
    Empty,
}

/// Set-level errors. These propagate out of
/// [`MediaSetController::load`](crate::MediaSetController::load).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("session id is missing")]
    MissingSession,

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// File-level errors. These are caught by the file controller and turned
/// into the fallback notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("session id is missing")]
    MissingSession,

    #[error(transparent)]
    Decrypt(#[from] DecryptError),

    #[error(transparent)]
    Attach(#[from] AttachError),

    #[error("render cancelled")]
    Cancelled,
}
