#![forbid(unsafe_code)]

//! Collaborator contracts consumed by the controllers.

use std::sync::Arc;

use async_trait::async_trait;
use inline_media_bridge::WebReadableStream;

use crate::{
    AttachError, Container, DecryptError, FileDescriptor, Locator, MediaHandle, RetrievalError,
    SessionId,
};

/// Transfer layer: resolves a locator into the files it contains.
#[async_trait]
pub trait Retrieval: Send + Sync {
    /// Resolve once the file set for `locator` is known. An empty result is
    /// treated as "still loading" by the caller.
    async fn download(
        &self,
        locator: &Locator,
        session: &SessionId,
    ) -> Result<Vec<FileDescriptor>, RetrievalError>;
}

/// Decryption layer: turns a retrieved file into a plaintext stream.
#[async_trait]
pub trait Decryptor: Send + Sync {
    /// Must fail when the session has no usable key.
    async fn decrypted_read_stream(
        &self,
        file: &FileDescriptor,
        session: &SessionId,
    ) -> Result<Box<dyn WebReadableStream>, DecryptError>;
}

/// Rendering engine: attaches a media handle to a container.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn append_to(
        &self,
        handle: Arc<dyn MediaHandle>,
        container: &Container,
    ) -> Result<(), AttachError>;
}
