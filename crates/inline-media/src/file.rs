#![forbid(unsafe_code)]

//! Per-file render controller.

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use inline_media_bridge::{StreamBridge, WebReadableStream};
use inline_media_events::{EventBus, RenderEvent};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::{
    Container, ContainerId, DecryptedFileHandle, Decryptor, FileDescriptor, FileKey, MediaConfig,
    MediaStream, RenderEngine, RenderError, RenderOutcome, RenderPhase, SessionId,
};

/// State of the current mount lifecycle.
#[derive(Default)]
struct Attempt {
    deps: Option<(ContainerId, Option<SessionId>)>,
    phase: RenderPhase,
    handle: Option<Arc<DecryptedFileHandle>>,
    cancel: Option<CancellationToken>,
}

enum Attempted {
    Attached,
    Superseded,
}

/// Renders one retrieved file into a container.
///
/// Each distinct `(container, session)` pair starts a mount lifecycle with
/// its own [`RenderOutcome`]. Calling [`render`](Self::render) again with the
/// same pair does nothing. A new pair supersedes the running attempt: its
/// stream is cancelled and its result discarded.
pub struct FileRenderController {
    key: FileKey,
    file: FileDescriptor,
    decryptor: Arc<dyn Decryptor>,
    engine: Arc<dyn RenderEngine>,
    config: MediaConfig,
    bus: EventBus,
    generation: AtomicU64,
    handles_created: AtomicUsize,
    attempt: Mutex<Attempt>,
    outcome: watch::Sender<RenderOutcome>,
}

impl FileRenderController {
    pub fn new(
        key: FileKey,
        file: FileDescriptor,
        decryptor: Arc<dyn Decryptor>,
        engine: Arc<dyn RenderEngine>,
        config: MediaConfig,
    ) -> Self {
        let bus = config.event_bus();
        let (outcome, _) = watch::channel(RenderOutcome::Pending);
        Self {
            key,
            file,
            decryptor,
            engine,
            config,
            bus,
            generation: AtomicU64::new(0),
            handles_created: AtomicUsize::new(0),
            attempt: Mutex::new(Attempt::default()),
            outcome,
        }
    }

    pub fn key(&self) -> &FileKey {
        &self.key
    }

    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    pub fn outcome(&self) -> RenderOutcome {
        *self.outcome.borrow()
    }

    pub fn subscribe_outcome(&self) -> watch::Receiver<RenderOutcome> {
        self.outcome.subscribe()
    }

    pub fn phase(&self) -> RenderPhase {
        self.attempt.lock().phase
    }

    /// Number of mount lifecycles started so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Decrypted handle of the current lifecycle, once created.
    pub fn decrypted_handle(&self) -> Option<Arc<DecryptedFileHandle>> {
        self.attempt.lock().handle.clone()
    }

    /// Decrypted handles created over the controller's lifetime.
    pub fn handles_created(&self) -> usize {
        self.handles_created.load(Ordering::SeqCst)
    }

    /// Mount the decrypted file into `container`.
    ///
    /// Never fails: any fault is logged and the container shows the
    /// fallback notice. Returns the outcome of the current lifecycle, which
    /// stays [`RenderOutcome::Pending`] while `container` is `None`.
    pub async fn render(
        &self,
        container: Option<&Container>,
        session: Option<&SessionId>,
    ) -> RenderOutcome {
        let Some(container) = container else {
            trace!(file = %self.key, "container not mounted yet");
            return self.outcome();
        };
        let Some((generation, cancel)) = self.begin(container.id(), session) else {
            trace!(file = %self.key, "dependencies unchanged, skipping render");
            return self.outcome();
        };

        match self.run(container, session, generation, &cancel).await {
            Ok(Attempted::Attached) => {
                if self.settle(generation, RenderOutcome::Succeeded, RenderPhase::Attached) {
                    debug!(file = %self.key, generation, "media attached");
                    self.bus.publish(RenderEvent::Attached {
                        name: self.key.name.clone(),
                        generation,
                    });
                } else {
                    self.superseded(generation);
                }
            }
            Ok(Attempted::Superseded) => self.superseded(generation),
            Err(err) => {
                if self.is_current(generation) {
                    self.fail(container, generation, &cancel, &err);
                } else {
                    self.superseded(generation);
                }
            }
        }

        self.outcome()
    }

    async fn run(
        &self,
        container: &Container,
        session: Option<&SessionId>,
        generation: u64,
        cancel: &CancellationToken,
    ) -> Result<Attempted, RenderError> {
        let session = session.ok_or(RenderError::MissingSession)?;

        self.set_phase(generation, RenderPhase::RequestingDecryption);
        self.bus.publish(RenderEvent::DecryptionRequested {
            name: self.key.name.clone(),
            generation,
        });
        let decrypted = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            source = self.decryptor.decrypted_read_stream(&self.file, session) => Some(source),
        };
        let Some(source) = decrypted else {
            return self.interrupted(generation);
        };
        let mut source = source?;
        if cancel.is_cancelled() {
            source.cancel("render attempt interrupted").await;
            return self.interrupted(generation);
        }

        self.set_phase(generation, RenderPhase::BridgingStream);
        let reader = StreamBridge::new(self.config.bridge.clone())
            .with_cancel(cancel.clone())
            .wrap(source);
        let handle = Arc::new(DecryptedFileHandle::new(
            &self.file,
            MediaStream::new(reader),
        ));
        self.handles_created.fetch_add(1, Ordering::SeqCst);
        {
            let mut attempt = self.attempt.lock();
            if !self.is_current(generation) {
                return Ok(Attempted::Superseded);
            }
            attempt.handle = Some(Arc::clone(&handle));
        }

        let view = container.guarded(cancel.clone());
        self.engine.append_to(handle, &view).await?;
        if cancel.is_cancelled() {
            return self.interrupted(generation);
        }
        Ok(Attempted::Attached)
    }

    /// A cancelled attempt was either replaced by a newer one or stopped
    /// through the parent token.
    fn interrupted(&self, generation: u64) -> Result<Attempted, RenderError> {
        if self.is_current(generation) {
            Err(RenderError::Cancelled)
        } else {
            Ok(Attempted::Superseded)
        }
    }

    /// Start a new lifecycle unless the dependencies are unchanged.
    fn begin(
        &self,
        container: ContainerId,
        session: Option<&SessionId>,
    ) -> Option<(u64, CancellationToken)> {
        let deps = (container, session.cloned());
        let mut attempt = self.attempt.lock();
        if attempt.deps.as_ref() == Some(&deps) {
            return None;
        }
        if let Some(previous) = attempt.cancel.take() {
            previous.cancel();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = self.config.attempt_token();
        *attempt = Attempt {
            deps: Some(deps),
            phase: RenderPhase::Idle,
            handle: None,
            cancel: Some(cancel.clone()),
        };
        self.outcome.send_replace(RenderOutcome::Pending);
        trace!(file = %self.key, generation, "render attempt started");
        Some((generation, cancel))
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn set_phase(&self, generation: u64, phase: RenderPhase) {
        let mut attempt = self.attempt.lock();
        if self.is_current(generation) {
            attempt.phase = phase;
        }
    }

    /// Move the current lifecycle to a terminal outcome. Returns false when
    /// `generation` is no longer current or the outcome is already terminal.
    fn settle(&self, generation: u64, next: RenderOutcome, phase: RenderPhase) -> bool {
        self.settle_with(generation, next, phase, || {})
    }

    /// Like [`settle`](Self::settle), running `on_settled` before a newer
    /// attempt can start.
    fn settle_with(
        &self,
        generation: u64,
        next: RenderOutcome,
        phase: RenderPhase,
        on_settled: impl FnOnce(),
    ) -> bool {
        let mut attempt = self.attempt.lock();
        if !self.is_current(generation) {
            return false;
        }
        let settled = self.outcome.send_if_modified(|outcome| {
            if outcome.can_become(next) {
                *outcome = next;
                true
            } else {
                false
            }
        });
        if settled {
            attempt.phase = phase;
            on_settled();
        }
        settled
    }

    fn fail(
        &self,
        container: &Container,
        generation: u64,
        cancel: &CancellationToken,
        err: &RenderError,
    ) {
        cancel.cancel();
        let notice = self.config.fallback_notice.clone();
        let shown = self.settle_with(generation, RenderOutcome::Failed, RenderPhase::Failed, || {
            container.show_fallback(notice);
        });
        if !shown {
            return;
        }
        error!(file = %self.key, generation, error = %err, "media failed to render");
        self.bus.publish_with(|| RenderEvent::Failed {
            name: self.key.name.clone(),
            generation,
            error: err.to_string(),
        });
    }

    fn superseded(&self, generation: u64) {
        debug!(file = %self.key, generation, "render attempt superseded");
        self.bus.publish(RenderEvent::Superseded {
            name: self.key.name.clone(),
            generation,
        });
    }
}

impl Drop for FileRenderController {
    fn drop(&mut self) {
        if let Some(cancel) = self.attempt.get_mut().cancel.take() {
            cancel.cancel();
        }
    }
}
