use std::{
    pin::pin,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use tokio::sync::Notify;

/// Byte accounting shared by the pump and the reader.
///
/// The pump pauses while the buffered byte count is at the limit or the
/// reader asked for a pause; releasing bytes or resuming wakes it.
#[derive(Debug)]
pub(crate) struct BufferTracker {
    buffered: AtomicUsize,
    max_buffer_bytes: usize,
    paused: AtomicBool,
    room: Notify,
}

impl BufferTracker {
    pub(crate) fn new(max_buffer_bytes: usize) -> Self {
        Self {
            buffered: AtomicUsize::new(0),
            max_buffer_bytes: max_buffer_bytes.max(1),
            paused: AtomicBool::new(false),
            room: Notify::new(),
        }
    }

    pub(crate) fn buffered(&self) -> usize {
        self.buffered.load(Ordering::Acquire)
    }

    pub(crate) fn reserve(&self, bytes_len: usize) {
        self.buffered.fetch_add(bytes_len, Ordering::AcqRel);
    }

    pub(crate) fn release(&self, bytes_len: usize) {
        self.buffered.fetch_sub(bytes_len, Ordering::AcqRel);
        self.room.notify_waiters();
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
        if !paused {
            self.room.notify_waiters();
        }
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    fn has_room(&self) -> bool {
        !self.is_paused() && self.buffered() < self.max_buffer_bytes
    }

    /// Resolve once the pump may pull another chunk.
    pub(crate) async fn wait_for_room(&self) {
        loop {
            // Register before checking so a release in between is not lost.
            let mut notified = pin!(self.room.notified());
            notified.as_mut().enable();
            if self.has_room() {
                return;
            }
            notified.await;
        }
    }
}
