#![forbid(unsafe_code)]

//! Incremental AES-128-CBC decryption.

use aes::Aes128;
use bytes::Bytes;
use cbc::{
    Decryptor,
    cipher::{
        BlockDecryptMut, KeyIvInit,
        block_padding::{NoPadding, Pkcs7},
    },
};
use tracing::trace;

use crate::{DecryptContext, DrmError, DrmResult};

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// Streaming AES-128-CBC decryptor.
///
/// Accepts ciphertext in arbitrarily sized pieces. Partial blocks are
/// carried to the next `push`, and the last full block is withheld until
/// [`finish`](Self::finish) because it holds the PKCS7 padding.
#[derive(Debug)]
pub struct ChunkDecryptor {
    ctx: DecryptContext,
    carry: Vec<u8>,
    finished: bool,
}

impl ChunkDecryptor {
    pub fn new(ctx: DecryptContext) -> Self {
        Self {
            ctx,
            carry: Vec::with_capacity(AES_BLOCK_SIZE * 2),
            finished: false,
        }
    }

    /// Feed ciphertext; returns whatever plaintext can be released now.
    pub fn push(&mut self, input: &[u8]) -> DrmResult<Bytes> {
        if self.finished {
            return Err(DrmError::Finished);
        }
        self.carry.extend_from_slice(input);

        let ready = ready_len(self.carry.len());
        if ready == 0 {
            return Ok(Bytes::new());
        }

        let mut blocks: Vec<u8> = self.carry.drain(..ready).collect();
        // CBC chaining: the next IV is the last ciphertext block of this run.
        let mut next_iv = [0u8; AES_BLOCK_SIZE];
        next_iv.copy_from_slice(&blocks[ready - AES_BLOCK_SIZE..]);

        let written = Decryptor::<Aes128>::new((&self.ctx.key).into(), (&self.ctx.iv).into())
            .decrypt_padded_mut::<NoPadding>(&mut blocks)
            .map_err(|e| DrmError::DecryptFailed(format!("CBC decrypt failed: {e}")))?
            .len();
        blocks.truncate(written);
        self.ctx.iv = next_iv;

        trace!(decrypted = written, carried = self.carry.len(), "cbc: blocks released");
        Ok(Bytes::from(blocks))
    }

    /// Decrypt the withheld final block and strip its padding.
    pub fn finish(&mut self) -> DrmResult<Bytes> {
        if self.finished {
            return Err(DrmError::Finished);
        }
        self.finished = true;

        match self.carry.len() {
            0 => return Err(DrmError::Empty),
            AES_BLOCK_SIZE => {}
            len => return Err(DrmError::Unaligned(len)),
        }

        let mut block = std::mem::take(&mut self.carry);
        let written = Decryptor::<Aes128>::new((&self.ctx.key).into(), (&self.ctx.iv).into())
            .decrypt_padded_mut::<Pkcs7>(&mut block)
            .map_err(|e| DrmError::DecryptFailed(format!("PKCS7 unpad failed: {e}")))?
            .len();
        block.truncate(written);

        trace!(decrypted = written, "cbc: final block decrypted with unpadding");
        Ok(Bytes::from(block))
    }
}

/// Bytes of `carried` that can be decrypted without touching the final block.
fn ready_len(carried: usize) -> usize {
    if carried <= AES_BLOCK_SIZE {
        return 0;
    }
    ((carried - 1) / AES_BLOCK_SIZE) * AES_BLOCK_SIZE
}

/// Encrypt `plaintext` the way a sender shares a file into a session.
#[cfg(any(test, feature = "test-utils"))]
pub fn aes128_cbc_encrypt(plaintext: &[u8], ctx: &DecryptContext) -> Vec<u8> {
    use cbc::{Encryptor, cipher::BlockEncryptMut};

    Encryptor::<Aes128>::new((&ctx.key).into(), (&ctx.iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}
