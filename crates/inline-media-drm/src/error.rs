#![forbid(unsafe_code)]

use thiserror::Error;

/// DRM decryption errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrmError {
    #[error("AES-128-CBC decryption failed: {0}")]
    DecryptFailed(String),

    #[error("ciphertext length {0} is not aligned to the AES block size")]
    Unaligned(usize),

    #[error("ciphertext is empty")]
    Empty,

    #[error("decryptor already finished")]
    Finished,
}

pub type DrmResult<T> = Result<T, DrmError>;
