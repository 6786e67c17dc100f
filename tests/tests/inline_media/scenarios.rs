//! The four reference scenarios, driven through in-memory collaborators.

use std::sync::Arc;

use inline_media::{
    Container, DecryptError, FALLBACK_NOTICE, FileDescriptor, FileKey, FileMetadata, Locator,
    MediaConfig, MediaError, MediaSetController, MediaSetView, Mounted, RenderOutcome, SessionId,
};
use inline_media_test_utils::{
    MemoryOpener, PassthroughDecryptor, RecordingEngine, StaticRetrieval, session, tracing_setup,
};
use rstest::rstest;

const LOCATOR: &str = "magnet:?xt=urn:btih:c9e15763f722f23e98a29decdfae341b98d53056";

fn png(name: &str) -> FileDescriptor {
    FileDescriptor::new(
        FileMetadata::new(name, 8),
        MemoryOpener::new(b"\x89PNG\r\n\x1a\n".to_vec()),
    )
}

#[rstest]
#[tokio::test]
async fn empty_result_keeps_loading(_tracing_setup: (), session: SessionId) {
    let retrieval = Arc::new(StaticRetrieval::new(Vec::new()));
    let engine = Arc::new(RecordingEngine::new());
    let set = MediaSetController::new(
        LOCATOR,
        retrieval.clone(),
        Arc::new(PassthroughDecryptor::new()),
        engine.clone(),
        MediaConfig::default(),
    );

    set.load(Some(&session)).await.unwrap();
    let outcomes = set.render_all(|_| Some(Container::new()), Some(&session)).await;

    assert_eq!(set.view(), MediaSetView::Loading);
    assert!(outcomes.is_empty());
    assert_eq!(retrieval.calls(), 1);
    assert_eq!(engine.calls(), 0);
}

#[rstest]
#[tokio::test]
async fn single_image_is_attached(_tracing_setup: (), session: SessionId) {
    let retrieval = Arc::new(StaticRetrieval::new(vec![png("a.png")]));
    let decryptor = Arc::new(PassthroughDecryptor::new());
    let engine = Arc::new(RecordingEngine::new());
    let set = MediaSetController::new(
        LOCATOR,
        retrieval.clone(),
        decryptor.clone(),
        engine.clone(),
        MediaConfig::default(),
    );
    let container = Container::new();

    set.load(Some(&session)).await.unwrap();
    let outcomes = set
        .render_all(|_| Some(container.clone()), Some(&session))
        .await;

    let key = FileKey {
        index: 0,
        name: "a.png".into(),
    };
    assert_eq!(set.view(), MediaSetView::Files(vec![key.clone()]));
    assert_eq!(outcomes, vec![(key, RenderOutcome::Succeeded)]);
    assert_eq!(decryptor.calls(), 1);
    assert_eq!(engine.calls(), 1);
    assert_eq!(engine.attachments()[0].container, container.id());
    assert!(!container.is_fallback());
    assert_eq!(retrieval.seen(), vec![(Locator::new(LOCATOR), session)]);
}

#[rstest]
#[tokio::test]
async fn rejected_key_shows_fallback(_tracing_setup: (), session: SessionId) {
    let set = MediaSetController::new(
        LOCATOR,
        Arc::new(StaticRetrieval::new(vec![png("a.png")])),
        Arc::new(PassthroughDecryptor::failing(DecryptError::KeyNotFound)),
        Arc::new(RecordingEngine::new()),
        MediaConfig::default(),
    );
    let container = Container::new();

    set.load(Some(&session)).await.unwrap();
    let outcomes = set
        .render_all(|_| Some(container.clone()), Some(&session))
        .await;

    assert_eq!(outcomes[0].1, RenderOutcome::Failed);
    assert_eq!(
        container.content(),
        Mounted::Fallback {
            notice: FALLBACK_NOTICE.into(),
        }
    );
    let file = set.file(&outcomes[0].0).unwrap();
    assert!(file.decrypted_handle().is_none());
}

#[rstest]
#[tokio::test]
async fn missing_session_never_downloads(_tracing_setup: ()) {
    let retrieval = Arc::new(StaticRetrieval::new(vec![png("a.png")]));
    let set = MediaSetController::new(
        LOCATOR,
        retrieval.clone(),
        Arc::new(PassthroughDecryptor::new()),
        Arc::new(RecordingEngine::new()),
        MediaConfig::default(),
    );

    let result = set.load(None).await;

    assert_eq!(result, Err(MediaError::MissingSession));
    assert_eq!(retrieval.calls(), 0);
    assert_eq!(set.view(), MediaSetView::Idle);
}

#[rstest]
#[case::empty("")]
#[case::whitespace_is_kept(" ")]
fn session_ids_are_validated(#[case] raw: &str) {
    let parsed = SessionId::new(raw);
    assert_eq!(parsed.is_ok(), !raw.is_empty());
}
