#![forbid(unsafe_code)]

use async_trait::async_trait;
use inline_media_bridge::{ReadResult, WebReadableStream, WebStreamError};
use tracing::debug;

use crate::{ChunkDecryptor, DecryptContext};

/// Web-style stream yielding the plaintext of a ciphertext web-style stream.
///
/// Single pass: after `Done` or an error every further `read` is `Done`.
pub struct DecryptingStream<R> {
    inner: R,
    decryptor: ChunkDecryptor,
    done: bool,
}

impl<R: WebReadableStream> DecryptingStream<R> {
    pub fn new(inner: R, ctx: DecryptContext) -> Self {
        Self {
            inner,
            decryptor: ChunkDecryptor::new(ctx),
            done: false,
        }
    }
}

#[async_trait]
impl<R: WebReadableStream> WebReadableStream for DecryptingStream<R> {
    async fn read(&mut self) -> Result<ReadResult, WebStreamError> {
        loop {
            if self.done {
                return Ok(ReadResult::Done);
            }

            let step = match self.inner.read().await {
                Ok(ReadResult::Chunk(ciphertext)) => self.decryptor.push(&ciphertext),
                Ok(ReadResult::Done) => {
                    self.done = true;
                    self.decryptor.finish()
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };

            match step {
                Ok(plaintext) if plaintext.is_empty() => continue,
                Ok(plaintext) => return Ok(ReadResult::Chunk(plaintext)),
                Err(e) => {
                    debug!(error = %e, "decrypting stream failed");
                    self.done = true;
                    return Err(WebStreamError::new(e.to_string()));
                }
            }
        }
    }

    async fn cancel(&mut self, reason: &str) {
        self.done = true;
        self.inner.cancel(reason).await;
    }
}
