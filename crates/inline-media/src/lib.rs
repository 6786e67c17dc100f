#![forbid(unsafe_code)]

//! # Inline media
//!
//! Renders media shared into a chat session: a locator is retrieved once,
//! every file in the result is decrypted with the session's key, and the
//! plaintext is streamed into a rendering engine. A file that fails shows a
//! short notice instead, without affecting its siblings.
//!
//! ## Quick start
//!
//! ```ignore
//! use inline_media::prelude::*;
//!
//! let session = SessionId::new("room-1")?;
//! let set = MediaSetController::new(
//!     "magnet:?xt=urn:btih:abc",
//!     retrieval,
//!     decryptor,
//!     engine,
//!     MediaConfig::default(),
//! );
//! set.load(Some(&session)).await?;
//! let outcomes = set.render_all(|_key| Some(Container::new()), Some(&session)).await;
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod bridge {
    pub use inline_media_bridge::*;
}

pub mod drm {
    pub use inline_media_drm::*;
}

pub mod events {
    pub use inline_media_events::*;
}

// ── Core ────────────────────────────────────────────────────────────────

mod config;
mod container;
mod decrypt;
mod dispatch;
mod error;
mod file;
mod media;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod outcome;
mod session;
mod set;
mod traits;

pub use config::{FALLBACK_NOTICE, MediaConfig};
pub use container::{Container, ContainerId, Mounted};
pub use decrypt::SessionKeyDecryptor;
pub use dispatch::{KindDispatcher, KindRenderer};
pub use error::{AttachError, DecryptError, MediaError, RenderError, RetrievalError, SessionError};
pub use file::FileRenderController;
pub use media::{
    DecryptedFileHandle, FileDescriptor, FileKey, FileMetadata, MediaHandle, MediaKind,
    MediaStream, RawStreamOpener,
};
pub use outcome::{RenderOutcome, RenderPhase};
pub use session::{Locator, SessionId};
pub use set::{MediaSetController, MediaSetView};
pub use traits::{Decryptor, RenderEngine, Retrieval};

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use inline_media_bridge::{BridgeEvent, BridgeOptions, WebReadableStream};
    pub use inline_media_events::{Event, EventBus, RenderEvent, SetEvent};

    pub use crate::{
        Container, Decryptor, FileDescriptor, FileKey, FileMetadata, FileRenderController,
        KindDispatcher, Locator, MediaConfig, MediaHandle, MediaKind, MediaSetController,
        MediaSetView, Mounted, RenderEngine, RenderOutcome, Retrieval, SessionId,
        SessionKeyDecryptor,
    };
}
