//! Web-style readable stream contract.

use std::fmt::Display;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::trace;

/// Result of one `read()` on a web-style stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    Chunk(Bytes),
    Done,
}

/// Failure reported by a web-style stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WebStreamError {
    message: String,
}

impl WebStreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pull-based byte stream with the read/cancel shape of a WHATWG
/// `ReadableStreamDefaultReader`.
///
/// Each `read()` resolves with the next chunk or `Done`. After `Done` or an
/// error the stream is exhausted. `cancel()` tells the producer the consumer
/// is no longer interested.
#[async_trait]
pub trait WebReadableStream: Send + 'static {
    async fn read(&mut self) -> Result<ReadResult, WebStreamError>;

    async fn cancel(&mut self, reason: &str);
}

#[async_trait]
impl<T: WebReadableStream + ?Sized> WebReadableStream for Box<T> {
    async fn read(&mut self) -> Result<ReadResult, WebStreamError> {
        (**self).read().await
    }

    async fn cancel(&mut self, reason: &str) {
        (**self).cancel(reason).await;
    }
}

/// Adapts a `futures::Stream` of byte chunks to [`WebReadableStream`].
pub struct ByteStreamSource<S> {
    inner: Option<S>,
}

impl<S> ByteStreamSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner: Some(inner) }
    }
}

#[async_trait]
impl<S, E> WebReadableStream for ByteStreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display + Send + 'static,
{
    async fn read(&mut self) -> Result<ReadResult, WebStreamError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(ReadResult::Done);
        };

        match inner.next().await {
            Some(Ok(bytes)) => Ok(ReadResult::Chunk(bytes)),
            Some(Err(e)) => {
                self.inner = None;
                Err(WebStreamError::new(e.to_string()))
            }
            None => {
                self.inner = None;
                Ok(ReadResult::Done)
            }
        }
    }

    async fn cancel(&mut self, reason: &str) {
        trace!(reason, "ByteStreamSource cancelled");
        self.inner = None;
    }
}
