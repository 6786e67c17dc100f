#![forbid(unsafe_code)]

/// Events emitted by a media set controller (one per locator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetEvent {
    /// Retrieval was triggered for the locator.
    RetrievalStarted { locator: String },
    /// A repeated `load` observed the initiation flag and did nothing.
    RetrievalSkipped { locator: String },
    /// Retrieval resolved with `count` files.
    FilesReady { locator: String, count: usize },
    /// Retrieval rejected.
    RetrievalFailed { locator: String, error: String },
}
