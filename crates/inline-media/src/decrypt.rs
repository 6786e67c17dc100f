#![forbid(unsafe_code)]

//! Decryption collaborator backed by `inline-media-drm`.

use std::collections::HashSet;

use async_trait::async_trait;
use inline_media_bridge::WebReadableStream;
use inline_media_drm::{DecryptContext, DecryptingStream};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{DecryptError, Decryptor, FileDescriptor, SessionId};

/// Decrypts files with a key derived from the session id.
///
/// Only sessions the local user has joined (see
/// [`register_session`](Self::register_session)) have a key; any other
/// session fails with [`DecryptError::KeyNotFound`].
#[derive(Debug, Default)]
pub struct SessionKeyDecryptor {
    sessions: RwLock<HashSet<SessionId>>,
}

impl SessionKeyDecryptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_session(&self, session: &SessionId) {
        self.sessions.write().insert(session.clone());
    }

    /// Returns true when the session was known.
    pub fn forget_session(&self, session: &SessionId) -> bool {
        self.sessions.write().remove(session)
    }

    pub fn has_key(&self, session: &SessionId) -> bool {
        self.sessions.read().contains(session)
    }
}

#[async_trait]
impl Decryptor for SessionKeyDecryptor {
    async fn decrypted_read_stream(
        &self,
        file: &FileDescriptor,
        session: &SessionId,
    ) -> Result<Box<dyn WebReadableStream>, DecryptError> {
        if !self.has_key(session) {
            warn!(file = file.name(), "no key for session");
            return Err(DecryptError::KeyNotFound);
        }

        let ctx = DecryptContext::for_session(session.as_str(), file.name());
        let raw = file.open_raw()?;
        debug!(file = file.name(), "decrypting stream opened");
        Ok(Box::new(DecryptingStream::new(raw, ctx)))
    }
}
