use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::{pump::pump, reader::BridgeReader, sync::BufferTracker, web::WebReadableStream};

#[derive(Debug)]
pub(crate) enum BridgeMsg {
    Data(Bytes),
    EndOfStream,
    Error(String),
}

#[derive(Clone, Debug)]
pub struct BridgeOptions {
    /// Buffered bytes at which the pump stops pulling from the source.
    pub max_buffer_bytes: usize,
    /// Capacity of the pump → reader message channel.
    pub channel_capacity: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 1024 * 1024,
            channel_capacity: 16,
        }
    }
}

impl BridgeOptions {
    pub fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// One-shot adapter from a [`WebReadableStream`] to a [`BridgeReader`].
///
/// `wrap` consumes the bridge: every decrypted stream needs its own.
#[derive(Debug, Default)]
pub struct StreamBridge {
    opts: BridgeOptions,
    cancel: Option<CancellationToken>,
}

impl StreamBridge {
    pub fn new(opts: BridgeOptions) -> Self {
        Self { opts, cancel: None }
    }

    /// Tie the bridge to a parent token. The bridge runs on a child token,
    /// so destroying the reader never cancels the parent.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Spawn the pump task and return the consuming end.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn wrap<R: WebReadableStream>(self, source: R) -> BridgeReader {
        let cancel = self
            .cancel
            .map_or_else(CancellationToken::new, |parent| parent.child_token());
        let (tx, rx) = mpsc::channel(self.opts.channel_capacity.max(1));
        let tracker = Arc::new(BufferTracker::new(self.opts.max_buffer_bytes));

        trace!(
            max_buffer_bytes = self.opts.max_buffer_bytes,
            channel_capacity = self.opts.channel_capacity,
            "StreamBridge::wrap (spawning pump)"
        );
        tokio::spawn(pump(source, tx, Arc::clone(&tracker), cancel.clone()));

        BridgeReader::new(rx, tracker, cancel)
    }
}
