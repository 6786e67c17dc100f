#![forbid(unsafe_code)]

use tokio::sync::broadcast;

use crate::Event;

/// Broadcast bus shared by the set and file controllers.
///
/// Events carry owned locator, file name and error strings. Publishing with
/// nobody subscribed drops them.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    /// Publish an event built by `build`, calling it only when somebody is
    /// subscribed.
    pub fn publish_with<E, F>(&self, build: F)
    where
        E: Into<Event>,
        F: FnOnce() -> E,
    {
        if self.has_subscribers() {
            self.publish(build());
        }
    }

    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.tx.receiver_count() > 0
    }

    /// Receivers see events published after this call only. A receiver that
    /// falls more than `capacity` events behind gets `RecvError::Lagged`.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
