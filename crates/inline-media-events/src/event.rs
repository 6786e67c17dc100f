#![forbid(unsafe_code)]

use crate::{RenderEvent, SetEvent};

/// Unified event for inline media rendering.
///
/// Hierarchical: each layer has its own variant with a sub-enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Set-level (retrieval) event.
    Set(SetEvent),
    /// File-level (render) event.
    Render(RenderEvent),
}

impl From<SetEvent> for Event {
    fn from(e: SetEvent) -> Self {
        Self::Set(e)
    }
}

impl From<RenderEvent> for Event {
    fn from(e: RenderEvent) -> Self {
        Self::Render(e)
    }
}
