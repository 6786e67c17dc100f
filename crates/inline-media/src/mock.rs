//! In-memory collaborators for tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use inline_media_bridge::{ReadResult, WebReadableStream, WebStreamError};
use parking_lot::Mutex;
use tokio::{io::AsyncReadExt, sync::Notify};

use crate::{
    AttachError, Container, ContainerId, DecryptError, Decryptor, FileDescriptor, Locator,
    MediaHandle, MediaKind, MediaStream, RawStreamOpener, RenderEngine, Retrieval,
    RetrievalError, SessionId,
};

const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Web-style stream over bytes held in memory.
pub struct MemoryStream {
    chunks: VecDeque<Bytes>,
    fail_with: Option<String>,
    cancelled: Arc<AtomicBool>,
}

impl MemoryStream {
    pub fn new(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        let data: Bytes = data.into();
        let chunk_size = chunk_size.max(1);
        let chunks = (0..data.len())
            .step_by(chunk_size)
            .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
            .collect();
        Self {
            chunks,
            fail_with: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail with `message` once every chunk was delivered.
    pub fn failing_after(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn cancelled_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

#[async_trait]
impl WebReadableStream for MemoryStream {
    async fn read(&mut self) -> Result<ReadResult, WebStreamError> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(ReadResult::Chunk(chunk));
        }
        match self.fail_with.take() {
            Some(message) => Err(WebStreamError::new(message)),
            None => Ok(ReadResult::Done),
        }
    }

    async fn cancel(&mut self, _reason: &str) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.chunks.clear();
        self.fail_with = None;
    }
}

/// Raw stream capability over bytes held in memory.
#[derive(Clone)]
pub struct MemoryOpener {
    data: Bytes,
    chunk_size: usize,
    fail_with: Option<String>,
    opens: Arc<AtomicUsize>,
}

impl MemoryOpener {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            fail_with: None,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Every opened stream fails with `message` after its last chunk.
    pub fn failing_after(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Shared counter of `open_raw` calls.
    pub fn opens(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opens)
    }
}

impl RawStreamOpener for MemoryOpener {
    fn open_raw(&self) -> Result<Box<dyn WebReadableStream>, RetrievalError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let stream = MemoryStream::new(self.data.clone(), self.chunk_size);
        Ok(match &self.fail_with {
            Some(message) => Box::new(stream.failing_after(message.clone())),
            None => Box::new(stream),
        })
    }
}

/// Retrieval that resolves with a fixed result.
pub struct StaticRetrieval {
    result: Result<Vec<FileDescriptor>, RetrievalError>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(Locator, SessionId)>>,
}

impl StaticRetrieval {
    pub fn new(files: Vec<FileDescriptor>) -> Self {
        Self::with_result(Ok(files))
    }

    pub fn failing(error: RetrievalError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<Vec<FileDescriptor>, RetrievalError>) -> Self {
        Self {
            result,
            gate: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Hold every call until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(Locator, SessionId)> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Retrieval for StaticRetrieval {
    async fn download(
        &self,
        locator: &Locator,
        session: &SessionId,
    ) -> Result<Vec<FileDescriptor>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push((locator.clone(), session.clone()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result.clone()
    }
}

/// Decryptor that hands the raw bytes through unchanged.
#[derive(Default)]
pub struct PassthroughDecryptor {
    failure: Option<DecryptError>,
    rejected: Option<SessionId>,
    first_call_gate: Mutex<Option<Arc<Notify>>>,
    calls: AtomicUsize,
}

impl PassthroughDecryptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: DecryptError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Fail with [`DecryptError::KeyNotFound`] for `session` only.
    pub fn rejecting(mut self, session: SessionId) -> Self {
        self.rejected = Some(session);
        self
    }

    /// Hold only the first call until `gate` is notified.
    pub fn gate_first_call(self, gate: Arc<Notify>) -> Self {
        *self.first_call_gate.lock() = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Decryptor for PassthroughDecryptor {
    async fn decrypted_read_stream(
        &self,
        file: &FileDescriptor,
        session: &SessionId,
    ) -> Result<Box<dyn WebReadableStream>, DecryptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.first_call_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if self.rejected.as_ref() == Some(session) {
            return Err(DecryptError::KeyNotFound);
        }
        Ok(file.open_raw()?)
    }
}

/// One `append_to` call seen by [`RecordingEngine`].
#[derive(Clone, Debug)]
pub struct Attachment {
    pub name: String,
    pub kind: MediaKind,
    pub container: ContainerId,
    pub stream: MediaStream,
    /// Bytes read from the stream when the engine drains.
    pub bytes: Option<Vec<u8>>,
}

/// Rendering engine that records what it was asked to attach.
#[derive(Default)]
pub struct RecordingEngine {
    attachments: Mutex<Vec<Attachment>>,
    failure: Option<AttachError>,
    drain: bool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read each stream to the end while attaching.
    pub fn draining() -> Self {
        Self {
            drain: true,
            ..Self::default()
        }
    }

    /// Mount, then fail, leaving a half-attached element behind.
    pub fn failing(error: AttachError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.attachments.lock().len()
    }
}

#[async_trait]
impl RenderEngine for RecordingEngine {
    async fn append_to(
        &self,
        handle: Arc<dyn MediaHandle>,
        container: &Container,
    ) -> Result<(), AttachError> {
        let metadata = handle.metadata();
        let stream = handle.open_stream()?;
        container.mount_media(metadata.name.clone(), handle.kind());

        let bytes = if self.drain {
            let mut buf = Vec::new();
            stream
                .clone()
                .read_to_end(&mut buf)
                .await
                .map_err(|e| AttachError::Stream(e.to_string()))?;
            Some(buf)
        } else {
            None
        };

        self.attachments.lock().push(Attachment {
            name: metadata.name.clone(),
            kind: handle.kind(),
            container: container.id(),
            stream,
            bytes,
        });

        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
