#![forbid(unsafe_code)]

//! Configuration shared by the set and file controllers.

use inline_media_bridge::BridgeOptions;
use inline_media_events::EventBus;
use tokio_util::sync::CancellationToken;

/// Notice shown in place of media that failed to render.
pub const FALLBACK_NOTICE: &str = "Media failed to render";

/// Configuration for [`MediaSetController`](crate::MediaSetController) and
/// the file controllers it creates.
#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// Buffering limits for every decrypted stream bridge.
    pub bridge: BridgeOptions,
    /// Parent token; every render attempt runs on a child of it.
    pub cancel: Option<CancellationToken>,
    /// Event bus (optional - if not provided, a private one is created).
    pub events: Option<EventBus>,
    /// Capacity of the private bus (used when `events` is not provided).
    pub events_channel_capacity: usize,
    /// Text shown when a file fails to render.
    pub fallback_notice: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeOptions::default(),
            cancel: None,
            events: None,
            events_channel_capacity: 64,
            fallback_notice: FALLBACK_NOTICE.to_string(),
        }
    }
}

impl MediaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bridge(mut self, bridge: BridgeOptions) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_events_channel_capacity(mut self, capacity: usize) -> Self {
        self.events_channel_capacity = capacity;
        self
    }

    pub fn with_fallback_notice(mut self, notice: impl Into<String>) -> Self {
        self.fallback_notice = notice.into();
        self
    }

    pub(crate) fn event_bus(&self) -> EventBus {
        self.events
            .clone()
            .unwrap_or_else(|| EventBus::new(self.events_channel_capacity))
    }

    pub(crate) fn attempt_token(&self) -> CancellationToken {
        self.cancel
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token)
    }
}
