//! Behaviour under concurrent loads and many sibling files.

use std::sync::Arc;

use inline_media::{
    Container, KindDispatcher, MediaConfig, MediaKind, MediaSetController, MediaSetView,
    Mounted, RenderOutcome, SessionId, SessionKeyDecryptor,
};
use inline_media_test_utils::{
    EncryptedFile, PassthroughDecryptor, RecordingEngine, StaticRetrieval, payload, session,
    tracing_setup,
};
use rstest::rstest;
use tokio::sync::Notify;

use crate::common::CollectingRenderer;

const LOCATOR: &str = "magnet:?xt=urn:btih:5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a";

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn download_once_under_concurrent_load(_tracing_setup: (), session: SessionId) {
    let gate = Arc::new(Notify::new());
    let file = EncryptedFile::new("a.png", payload(1, 32));
    let retrieval = Arc::new(
        StaticRetrieval::new(vec![file.descriptor(&session)]).gated(gate.clone()),
    );
    let set = Arc::new(MediaSetController::new(
        LOCATOR,
        retrieval.clone(),
        Arc::new(PassthroughDecryptor::new()),
        Arc::new(RecordingEngine::new()),
        MediaConfig::default(),
    ));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let set = Arc::clone(&set);
            let session = session.clone();
            tokio::spawn(async move { set.load(Some(&session)).await })
        })
        .collect();
    gate.notify_one();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(retrieval.calls(), 1);
    assert_eq!(set.files().len(), 1);
    assert!(matches!(set.view(), MediaSetView::Files(keys) if keys.len() == 1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn siblings_fail_independently(_tracing_setup: (), session: SessionId) {
    let files: Vec<EncryptedFile> = (0..20)
        .map(|i| {
            let file = EncryptedFile::new(format!("photo-{i}.jpg"), payload(i, 700))
                .with_chunk_size(64);
            if i % 2 == 1 {
                file.failing_after("peer disconnected")
            } else {
                file
            }
        })
        .collect();
    let decryptor = SessionKeyDecryptor::new();
    decryptor.register_session(&session);
    let renderer = CollectingRenderer::default();
    let set = MediaSetController::new(
        LOCATOR,
        Arc::new(StaticRetrieval::new(
            files.iter().map(|f| f.descriptor(&session)).collect(),
        )),
        Arc::new(decryptor),
        Arc::new(KindDispatcher::new().with_renderer(MediaKind::Image, renderer.clone())),
        MediaConfig::default(),
    );
    let containers: Vec<Container> = (0..files.len()).map(|_| Container::new()).collect();

    set.load(Some(&session)).await.unwrap();
    let outcomes = set
        .render_all(|key| Some(containers[key.index].clone()), Some(&session))
        .await;

    for (key, outcome) in outcomes {
        if key.index % 2 == 1 {
            assert_eq!(outcome, RenderOutcome::Failed, "{key}");
            assert!(containers[key.index].is_fallback());
        } else {
            assert_eq!(outcome, RenderOutcome::Succeeded, "{key}");
            assert_eq!(
                renderer.painted(&key.name).as_deref(),
                Some(files[key.index].plaintext())
            );
        }
    }
    assert_eq!(renderer.count(), 10);
}

#[rstest]
#[tokio::test]
async fn session_change_starts_over(_tracing_setup: (), session: SessionId) {
    let stale = SessionId::new("!expired:example.org").unwrap();
    let file = EncryptedFile::new("a.png", payload(9, 256));
    let decryptor = SessionKeyDecryptor::new();
    decryptor.register_session(&session);
    let renderer = CollectingRenderer::default();
    let set = MediaSetController::new(
        LOCATOR,
        Arc::new(StaticRetrieval::new(vec![file.descriptor(&session)])),
        Arc::new(decryptor),
        Arc::new(KindDispatcher::new().with_renderer(MediaKind::Image, renderer.clone())),
        MediaConfig::default(),
    );
    let container = Container::new();

    set.load(Some(&session)).await.unwrap();
    let first = set
        .render_all(|_| Some(container.clone()), Some(&stale))
        .await;
    assert_eq!(first[0].1, RenderOutcome::Failed);
    assert!(container.is_fallback());

    let second = set
        .render_all(|_| Some(container.clone()), Some(&session))
        .await;
    assert_eq!(second[0].1, RenderOutcome::Succeeded);
    assert_eq!(
        container.content(),
        Mounted::Media {
            name: "a.png".into(),
            kind: MediaKind::Image,
        }
    );

    let controller = set.file(&second[0].0).unwrap();
    assert_eq!(controller.generation(), 2);
    assert_eq!(controller.handles_created(), 1);
    assert_eq!(renderer.painted("a.png").as_deref(), Some(file.plaintext()));
}
