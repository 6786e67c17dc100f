#![forbid(unsafe_code)]

//! Key material for one encrypted file.

use sha2::{Digest, Sha256};

const KEY_DOMAIN: &[u8] = b"inline-media/key";
const IV_DOMAIN: &[u8] = b"inline-media/iv";

/// AES-128-CBC key and IV for one file.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct DecryptContext {
    /// AES-128 key (16 bytes).
    pub key: [u8; 16],
    /// Initialization vector (16 bytes). Advances as chunks are decrypted.
    pub iv: [u8; 16],
}

impl DecryptContext {
    pub fn new(key: [u8; 16], iv: [u8; 16]) -> Self {
        Self { key, iv }
    }

    /// Derive the context for `file_name` shared in `session`.
    pub fn for_session(session: &str, file_name: &str) -> Self {
        let key = truncate(
            Sha256::new()
                .chain_update(KEY_DOMAIN)
                .chain_update([0u8])
                .chain_update(session.as_bytes())
                .finalize()
                .as_slice(),
        );
        let iv = truncate(
            Sha256::new()
                .chain_update(IV_DOMAIN)
                .chain_update([0u8])
                .chain_update(session.as_bytes())
                .chain_update([0u8])
                .chain_update(file_name.as_bytes())
                .finalize()
                .as_slice(),
        );
        Self { key, iv }
    }
}

fn truncate(digest: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}
