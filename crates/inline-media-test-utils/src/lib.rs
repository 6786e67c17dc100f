#![forbid(unsafe_code)]
#![expect(
    clippy::unwrap_used,
    reason = "test utility crate, unwraps are acceptable"
)]

//! Shared test utilities for the inline-media workspace.

pub mod encrypted;
pub mod fixtures;
pub mod rng;

pub use encrypted::EncryptedFile;
pub use fixtures::*;
pub use inline_media::mock::{
    Attachment, MemoryOpener, MemoryStream, PassthroughDecryptor, RecordingEngine,
    StaticRetrieval,
};
pub use rng::*;
