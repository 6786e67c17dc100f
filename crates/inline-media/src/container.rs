#![forbid(unsafe_code)]

//! Mount points files render into.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::MediaKind;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

/// What a container currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mounted {
    Empty,
    Media { name: String, kind: MediaKind },
    /// Static notice, rendered in italics in place of the media.
    Fallback { notice: String },
}

/// Mount point for one file.
///
/// Clones share the same content. Mounting replaces whatever was shown
/// before, so a fallback never sits next to a half-rendered element.
///
/// A guarded view (handed to the rendering engine for one render attempt)
/// ignores every write once its attempt token is cancelled.
#[derive(Clone, Debug)]
pub struct Container {
    id: ContainerId,
    content: Arc<Mutex<Mounted>>,
    guard: Option<CancellationToken>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            id: ContainerId(NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed)),
            content: Arc::new(Mutex::new(Mounted::Empty)),
            guard: None,
        }
    }

    /// View of the same mount point that goes read-only once `token` is
    /// cancelled.
    pub(crate) fn guarded(&self, token: CancellationToken) -> Self {
        Self {
            id: self.id,
            content: Arc::clone(&self.content),
            guard: Some(token),
        }
    }

    /// False for a guarded view whose attempt was cancelled.
    pub fn is_writable(&self) -> bool {
        !self
            .guard
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn write(&self, next: Mounted) {
        let mut content = self.content.lock();
        // Checked under the content lock so a write never lands after the
        // newer attempt that cancelled this view.
        if !self.is_writable() {
            trace!(container = self.id.0, "write to cancelled view ignored");
            return;
        }
        *content = next;
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn content(&self) -> Mounted {
        self.content.lock().clone()
    }

    pub fn mount_media(&self, name: impl Into<String>, kind: MediaKind) {
        self.write(Mounted::Media {
            name: name.into(),
            kind,
        });
    }

    pub fn show_fallback(&self, notice: impl Into<String>) {
        self.write(Mounted::Fallback {
            notice: notice.into(),
        });
    }

    pub fn clear(&self) {
        self.write(Mounted::Empty);
    }

    pub fn is_fallback(&self) -> bool {
        matches!(*self.content.lock(), Mounted::Fallback { .. })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
