#![forbid(unsafe_code)]

//! Session-scoped decryption for inline media.
//!
//! Files shared into a room are encrypted with AES-128-CBC (PKCS7) under a
//! key derived from the room's session id. This crate derives that key and
//! decrypts ciphertext incrementally, so plaintext can be streamed into a
//! renderer while the transfer is still arriving.
//!
//! # Key derivation
//!
//! - key: first 16 bytes of `SHA-256("inline-media/key" || 0 || session)`
//! - iv: first 16 bytes of `SHA-256("inline-media/iv" || 0 || session || 0 || file name)`

mod context;
mod decrypt;
mod error;
mod stream;

pub use context::DecryptContext;
#[cfg(any(test, feature = "test-utils"))]
pub use decrypt::aes128_cbc_encrypt;
pub use decrypt::{AES_BLOCK_SIZE, ChunkDecryptor};
pub use error::{DrmError, DrmResult};
pub use stream::DecryptingStream;
