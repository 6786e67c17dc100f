//! # Inline media stream bridge
//!
//! Adapts a web-style readable byte stream (pull: `read()` resolves with a
//! chunk or done, `cancel()` aborts) into the push/pause, event-driven shape a
//! rendering engine consumes, the same shape a native file or socket stream
//! has.
//!
//! ## Core Components
//!
//! - [`WebReadableStream`]: the source contract (decrypted bytes arrive here)
//! - [`StreamBridge`]: one-shot builder that spawns the pump task
//! - [`BridgeReader`]: consuming end, `Stream<Item = BridgeEvent>` + `AsyncRead`
//!
//! ## Event Semantics (Normative)
//!
//! - `Data` events carry the source's bytes unchanged and in order.
//! - `End` follows the last `Data` when the source reports done.
//! - `Error` is delivered at most once; no `End` follows it.
//! - After `End` or `Error` the reader yields `None` forever. There is no
//!   reset: a fresh bridge is needed per source.
//!
//! ## Backpressure
//!
//! The pump stops pulling while buffered bytes are at `max_buffer_bytes` or
//! the consumer called [`BridgeReader::pause`]. Consuming data or calling
//! [`BridgeReader::resume`] lets it continue. Dropping or destroying the
//! reader cancels the source.

#![forbid(unsafe_code)]

mod bridge;
mod errors;
mod pump;
mod reader;
mod sync;
mod web;

pub use bridge::{BridgeOptions, StreamBridge};
pub use errors::BridgeError;
pub use reader::{BridgeEvent, BridgeReader, BridgeState};
pub use web::{ByteStreamSource, ReadResult, WebReadableStream, WebStreamError};
