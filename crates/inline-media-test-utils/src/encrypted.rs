//! Files encrypted the way [`SessionKeyDecryptor`] expects.
//!
//! [`SessionKeyDecryptor`]: inline_media::SessionKeyDecryptor

use inline_media::{FileDescriptor, FileMetadata, SessionId, mock::MemoryOpener};
use inline_media_drm::{DecryptContext, aes128_cbc_encrypt};

/// Builder for one encrypted file of a retrieval result.
pub struct EncryptedFile {
    name: String,
    plaintext: Vec<u8>,
    mime: Option<String>,
    chunk_size: usize,
    fail_after: Option<String>,
}

impl EncryptedFile {
    pub fn new(name: impl Into<String>, plaintext: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            plaintext: plaintext.into(),
            mime: None,
            chunk_size: 4096,
            fail_after: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Size of the ciphertext chunks the raw stream yields.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Raw stream fails with `message` after the ciphertext.
    pub fn failing_after(mut self, message: impl Into<String>) -> Self {
        self.fail_after = Some(message.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    pub fn ciphertext(&self, session: &SessionId) -> Vec<u8> {
        let ctx = DecryptContext::for_session(session.as_str(), &self.name);
        aes128_cbc_encrypt(&self.plaintext, &ctx)
    }

    /// Descriptor whose raw stream yields the ciphertext for `session`.
    pub fn descriptor(&self, session: &SessionId) -> FileDescriptor {
        let ciphertext = self.ciphertext(session);
        let mut metadata = FileMetadata::new(self.name.clone(), ciphertext.len() as u64);
        if let Some(mime) = &self.mime {
            metadata = metadata.with_mime(mime.clone());
        }
        let mut opener = MemoryOpener::new(ciphertext).with_chunk_size(self.chunk_size);
        if let Some(message) = &self.fail_after {
            opener = opener.failing_after(message.clone());
        }
        FileDescriptor::new(metadata, opener)
    }
}
