#![forbid(unsafe_code)]

/// Result of one mount lifecycle of a file.
///
/// `Pending` moves to exactly one of the terminal states and never leaves it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderOutcome {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

impl RenderOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Succeeded | Self::Failed)
        )
    }
}

/// Where a render attempt currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderPhase {
    #[default]
    Idle,
    RequestingDecryption,
    BridgingStream,
    Attached,
    Failed,
}
