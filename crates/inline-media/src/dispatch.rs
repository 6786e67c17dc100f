#![forbid(unsafe_code)]

//! Rendering engine that picks a renderer by declared media kind.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    AttachError, Container, FileMetadata, MediaHandle, MediaKind, MediaStream, RenderEngine,
};

/// Paints one kind of media from its byte stream.
#[async_trait]
pub trait KindRenderer: Send + Sync {
    /// Consume `stream` into the element already mounted in `container`.
    async fn render(
        &self,
        stream: MediaStream,
        metadata: &FileMetadata,
        container: &Container,
    ) -> Result<(), AttachError>;
}

/// [`RenderEngine`] that dispatches on [`MediaHandle::kind`].
#[derive(Default)]
pub struct KindDispatcher {
    renderers: HashMap<MediaKind, Arc<dyn KindRenderer>>,
}

impl KindDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer(mut self, kind: MediaKind, renderer: impl KindRenderer + 'static) -> Self {
        self.renderers.insert(kind, Arc::new(renderer));
        self
    }

    pub fn supports(&self, kind: MediaKind) -> bool {
        self.renderers.contains_key(&kind)
    }
}

impl fmt::Debug for KindDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindDispatcher")
            .field("kinds", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl RenderEngine for KindDispatcher {
    async fn append_to(
        &self,
        handle: Arc<dyn MediaHandle>,
        container: &Container,
    ) -> Result<(), AttachError> {
        let metadata = handle.metadata();
        let kind = handle.kind();
        let Some(renderer) = self.renderers.get(&kind) else {
            return Err(AttachError::Unsupported {
                kind,
                name: metadata.name.clone(),
            });
        };

        let stream = handle.open_stream()?;
        container.mount_media(metadata.name.clone(), kind);
        debug!(name = %metadata.name, %kind, "dispatching to renderer");
        renderer.render(stream, metadata, container).await
    }
}
