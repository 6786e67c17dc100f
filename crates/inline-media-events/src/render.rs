#![forbid(unsafe_code)]

/// Events emitted by per-file render controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// A decrypted stream was requested for the file.
    DecryptionRequested { name: String, generation: u64 },
    /// The decrypted handle was attached to its container.
    Attached { name: String, generation: u64 },
    /// The attempt failed and the fallback notice is shown.
    Failed {
        name: String,
        generation: u64,
        error: String,
    },
    /// A newer attempt replaced this one before it finished.
    Superseded { name: String, generation: u64 },
}

impl RenderEvent {
    /// Name of the file the event refers to.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::DecryptionRequested { name, .. }
            | Self::Attached { name, .. }
            | Self::Failed { name, .. }
            | Self::Superseded { name, .. } => name,
        }
    }
}
