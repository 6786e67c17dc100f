#![forbid(unsafe_code)]

//! Retrieval of a media set and fan-out to per-file controllers.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::join_all;
use inline_media_events::{Event, EventBus, SetEvent};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, trace, warn};

use crate::{
    Container, Decryptor, FileDescriptor, FileKey, FileRenderController, Locator, MediaConfig,
    MediaError, RenderEngine, RenderOutcome, Retrieval, SessionId,
};

/// What the set currently presents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaSetView {
    /// Retrieval has not been initiated.
    Idle,
    /// Retrieval is outstanding or resolved with no files.
    Loading,
    /// One entry per retrieved file, in retrieval order.
    Files(Vec<FileKey>),
}

/// Retrieves the files behind one locator, once, and renders each of them.
pub struct MediaSetController {
    locator: Locator,
    retrieval: Arc<dyn Retrieval>,
    decryptor: Arc<dyn Decryptor>,
    engine: Arc<dyn RenderEngine>,
    config: MediaConfig,
    bus: EventBus,
    initiated: AtomicBool,
    files: watch::Sender<Vec<Arc<FileRenderController>>>,
}

impl MediaSetController {
    pub fn new(
        locator: impl Into<Locator>,
        retrieval: Arc<dyn Retrieval>,
        decryptor: Arc<dyn Decryptor>,
        engine: Arc<dyn RenderEngine>,
        config: MediaConfig,
    ) -> Self {
        let bus = config.event_bus();
        let config = config.with_events(bus.clone());
        let (files, _) = watch::channel(Vec::new());
        Self {
            locator: locator.into(),
            retrieval,
            decryptor,
            engine,
            config,
            bus,
            initiated: AtomicBool::new(false),
            files,
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn is_initiated(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Retrieve the file set.
    ///
    /// Only the first call with a session reaches the retrieval
    /// collaborator; later and concurrent calls return `Ok(())` at once.
    ///
    /// # Errors
    ///
    /// [`MediaError::MissingSession`] without a session (nothing is marked
    /// as initiated), [`MediaError::Retrieval`] when retrieval rejects.
    pub async fn load(&self, session: Option<&SessionId>) -> Result<(), MediaError> {
        if self.initiated.load(Ordering::SeqCst) {
            self.skipped();
            return Ok(());
        }
        let Some(session) = session else {
            error!(locator = %self.locator, "cannot retrieve media without a session");
            return Err(MediaError::MissingSession);
        };
        if self.initiated.swap(true, Ordering::SeqCst) {
            self.skipped();
            return Ok(());
        }

        debug!(locator = %self.locator, "starting retrieval");
        self.bus.publish_with(|| SetEvent::RetrievalStarted {
            locator: self.locator.to_string(),
        });

        let files = match self.retrieval.download(&self.locator, session).await {
            Ok(files) => files,
            Err(err) => {
                error!(locator = %self.locator, error = %err, "retrieval failed");
                self.bus.publish_with(|| SetEvent::RetrievalFailed {
                    locator: self.locator.to_string(),
                    error: err.to_string(),
                });
                return Err(err.into());
            }
        };

        debug!(locator = %self.locator, count = files.len(), "files ready");
        self.bus.publish_with(|| SetEvent::FilesReady {
            locator: self.locator.to_string(),
            count: files.len(),
        });
        let controllers = self.controllers_for(files);
        self.files.send_replace(controllers);
        Ok(())
    }

    fn skipped(&self) {
        trace!(locator = %self.locator, "retrieval already initiated");
        self.bus.publish_with(|| SetEvent::RetrievalSkipped {
            locator: self.locator.to_string(),
        });
    }

    fn controllers_for(&self, files: Vec<FileDescriptor>) -> Vec<Arc<FileRenderController>> {
        let mut seen = HashSet::new();
        files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                let name = file.name().to_string();
                if !seen.insert(name.clone()) {
                    warn!(locator = %self.locator, index, name, "duplicate file name in media set");
                }
                Arc::new(FileRenderController::new(
                    FileKey { index, name },
                    file,
                    Arc::clone(&self.decryptor),
                    Arc::clone(&self.engine),
                    self.config.clone(),
                ))
            })
            .collect()
    }

    pub fn view(&self) -> MediaSetView {
        if !self.is_initiated() {
            return MediaSetView::Idle;
        }
        let files = self.files.borrow();
        if files.is_empty() {
            MediaSetView::Loading
        } else {
            MediaSetView::Files(files.iter().map(|f| f.key().clone()).collect())
        }
    }

    pub fn files(&self) -> Vec<Arc<FileRenderController>> {
        self.files.borrow().clone()
    }

    pub fn file(&self, key: &FileKey) -> Option<Arc<FileRenderController>> {
        self.files
            .borrow()
            .iter()
            .find(|f| f.key() == key)
            .cloned()
    }

    pub fn subscribe_files(&self) -> watch::Receiver<Vec<Arc<FileRenderController>>> {
        self.files.subscribe()
    }

    /// Render every file concurrently into the container `mount` returns
    /// for it. Outcomes come back in retrieval order.
    pub async fn render_all<F>(
        &self,
        mut mount: F,
        session: Option<&SessionId>,
    ) -> Vec<(FileKey, RenderOutcome)>
    where
        F: FnMut(&FileKey) -> Option<Container>,
    {
        let files = self.files();
        let containers: Vec<Option<Container>> = files.iter().map(|f| mount(f.key())).collect();
        join_all(files.iter().zip(&containers).map(|(file, container)| async move {
            let outcome = file.render(container.as_ref(), session).await;
            (file.key().clone(), outcome)
        }))
        .await
    }
}
