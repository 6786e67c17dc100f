use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use inline_media::{AttachError, Container, FileMetadata, KindRenderer, MediaStream};
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;

/// Reads every stream to the end and keeps the bytes by file name.
#[derive(Clone, Default)]
pub struct CollectingRenderer {
    painted: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl CollectingRenderer {
    pub fn painted(&self, name: &str) -> Option<Vec<u8>> {
        self.painted.lock().get(name).cloned()
    }

    pub fn count(&self) -> usize {
        self.painted.lock().len()
    }
}

#[async_trait]
impl KindRenderer for CollectingRenderer {
    async fn render(
        &self,
        mut stream: MediaStream,
        metadata: &FileMetadata,
        _container: &Container,
    ) -> Result<(), AttachError> {
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| AttachError::Stream(e.to_string()))?;
        self.painted.lock().insert(metadata.name.clone(), bytes);
        Ok(())
    }
}
