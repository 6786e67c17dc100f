use std::{
    io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};

use bytes::Bytes;
use futures::Stream;
use tokio::{
    io::{AsyncRead, ReadBuf},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::{bridge::BridgeMsg, errors::BridgeError, sync::BufferTracker};

/// Event delivered to the consumer of a bridged stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Next chunk of bytes, in source order.
    Data(Bytes),
    /// The source finished. Nothing follows.
    End,
    /// The source failed or the bridge was cancelled. Nothing follows.
    Error(BridgeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Flowing,
    Paused,
    Ended,
    Errored,
    Destroyed,
}

/// Consuming end of a [`StreamBridge`](crate::StreamBridge).
///
/// Yields [`BridgeEvent`]s as a `Stream` and also implements `AsyncRead`
/// (`End` is EOF, `Error` is an `io::Error`). Once `End` or `Error` has
/// been delivered the reader is exhausted for good.
#[derive(Debug)]
pub struct BridgeReader {
    rx: mpsc::Receiver<BridgeMsg>,
    tracker: Arc<BufferTracker>,
    cancel: CancellationToken,
    pending: Option<Bytes>,
    terminal: Option<BridgeState>,
}

impl BridgeReader {
    pub(crate) fn new(
        rx: mpsc::Receiver<BridgeMsg>,
        tracker: Arc<BufferTracker>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rx,
            tracker,
            cancel,
            pending: None,
            terminal: None,
        }
    }

    pub fn state(&self) -> BridgeState {
        match self.terminal {
            Some(state) => state,
            None if self.tracker.is_paused() => BridgeState::Paused,
            None => BridgeState::Flowing,
        }
    }

    /// Bytes pushed by the pump and not yet taken by the consumer.
    pub fn buffered_bytes(&self) -> usize {
        self.tracker.buffered()
    }

    /// Stop pulling from the source. Already buffered chunks stay readable.
    pub fn pause(&self) {
        self.tracker.set_paused(true);
    }

    pub fn resume(&self) {
        self.tracker.set_paused(false);
    }

    /// Cancel the source and drop everything buffered.
    pub fn destroy(&mut self) {
        if self.terminal.is_none() {
            trace!("BridgeReader destroyed");
            self.terminal = Some(BridgeState::Destroyed);
        }
        self.pending = None;
        self.cancel.cancel();
        self.rx.close();
    }

    pub fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<Option<BridgeEvent>> {
        if let Some(bytes) = self.pending.take() {
            return Poll::Ready(Some(BridgeEvent::Data(bytes)));
        }
        if self.terminal.is_some() {
            return Poll::Ready(None);
        }

        let event = match ready!(self.rx.poll_recv(cx)) {
            Some(BridgeMsg::Data(bytes)) => {
                self.tracker.release(bytes.len());
                BridgeEvent::Data(bytes)
            }
            Some(BridgeMsg::EndOfStream) => {
                self.terminal = Some(BridgeState::Ended);
                BridgeEvent::End
            }
            Some(BridgeMsg::Error(message)) => {
                self.terminal = Some(BridgeState::Errored);
                BridgeEvent::Error(BridgeError::Source(message))
            }
            None => {
                self.terminal = Some(BridgeState::Errored);
                if self.cancel.is_cancelled() {
                    BridgeEvent::Error(BridgeError::Cancelled)
                } else {
                    BridgeEvent::Error(BridgeError::PumpStopped)
                }
            }
        };
        Poll::Ready(Some(event))
    }
}

impl Stream for BridgeReader {
    type Item = BridgeEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_event(cx)
    }
}

impl AsyncRead for BridgeReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        match ready!(this.poll_event(cx)) {
            Some(BridgeEvent::Data(mut bytes)) => {
                let n = bytes.len().min(buf.remaining());
                buf.put_slice(&bytes[..n]);
                if n < bytes.len() {
                    this.pending = Some(bytes.split_off(n));
                }
                Poll::Ready(Ok(()))
            }
            Some(BridgeEvent::End) | None => Poll::Ready(Ok(())),
            Some(BridgeEvent::Error(e)) => Poll::Ready(Err(io::Error::other(e))),
        }
    }
}

impl Drop for BridgeReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
