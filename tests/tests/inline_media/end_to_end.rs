//! Retrieval, session-key decryption and kind dispatch wired together.

use std::sync::Arc;

use inline_media::{
    Container, KindDispatcher, MediaConfig, MediaKind, MediaSetController, Mounted,
    RenderOutcome, SessionId, SessionKeyDecryptor,
    events::{Event, RenderEvent},
};
use inline_media_test_utils::{EncryptedFile, StaticRetrieval, payload, session, tracing_setup};
use rstest::rstest;

use crate::common::CollectingRenderer;

const LOCATOR: &str = "magnet:?xt=urn:btih:0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c";

fn dispatcher(renderer: &CollectingRenderer) -> KindDispatcher {
    KindDispatcher::new()
        .with_renderer(MediaKind::Image, renderer.clone())
        .with_renderer(MediaKind::Video, renderer.clone())
        .with_renderer(MediaKind::Pdf, renderer.clone())
}

fn keyed_decryptor(session: &SessionId) -> Arc<SessionKeyDecryptor> {
    let decryptor = SessionKeyDecryptor::new();
    decryptor.register_session(session);
    Arc::new(decryptor)
}

#[rstest]
#[case::byte_at_a_time(1)]
#[case::unaligned(7)]
#[case::one_block(16)]
#[case::large(4096)]
#[tokio::test]
async fn plaintext_reaches_renderers(
    _tracing_setup: (),
    session: SessionId,
    #[case] chunk_size: usize,
) {
    let files = [
        EncryptedFile::new("cat.png", payload(1, 333)).with_chunk_size(chunk_size),
        EncryptedFile::new("clip.mp4", payload(2, 4096)).with_chunk_size(chunk_size),
        EncryptedFile::new("paper.pdf", payload(3, 15)).with_chunk_size(chunk_size),
    ];
    let retrieval =
        StaticRetrieval::new(files.iter().map(|f| f.descriptor(&session)).collect());
    let renderer = CollectingRenderer::default();
    let set = MediaSetController::new(
        LOCATOR,
        Arc::new(retrieval),
        keyed_decryptor(&session),
        Arc::new(dispatcher(&renderer)),
        MediaConfig::default(),
    );

    set.load(Some(&session)).await.unwrap();
    let outcomes = set.render_all(|_| Some(Container::new()), Some(&session)).await;

    assert!(
        outcomes
            .iter()
            .all(|(_, outcome)| *outcome == RenderOutcome::Succeeded)
    );
    for file in &files {
        assert_eq!(renderer.painted(file.name()).as_deref(), Some(file.plaintext()));
    }
}

#[rstest]
#[tokio::test]
async fn unknown_session_renders_fallbacks(_tracing_setup: (), session: SessionId) {
    let file = EncryptedFile::new("cat.png", payload(4, 64));
    let renderer = CollectingRenderer::default();
    let set = MediaSetController::new(
        LOCATOR,
        Arc::new(StaticRetrieval::new(vec![file.descriptor(&session)])),
        Arc::new(SessionKeyDecryptor::new()),
        Arc::new(dispatcher(&renderer)),
        MediaConfig::default(),
    );
    let mut events = set.subscribe();
    let container = Container::new();

    set.load(Some(&session)).await.unwrap();
    let outcomes = set
        .render_all(|_| Some(container.clone()), Some(&session))
        .await;

    assert_eq!(outcomes[0].1, RenderOutcome::Failed);
    assert!(container.is_fallback());
    assert_eq!(renderer.count(), 0);

    let mut errors = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Event::Render(RenderEvent::Failed { error, .. }) = event {
            errors.push(error);
        }
    }
    assert_eq!(errors, vec!["key not found".to_string()]);
}

#[rstest]
#[tokio::test]
async fn unsupported_kind_fails_alone(_tracing_setup: (), session: SessionId) {
    let image = EncryptedFile::new("cat.png", payload(5, 100));
    let archive = EncryptedFile::new("backup.tar.gz", payload(6, 100));
    let renderer = CollectingRenderer::default();
    let set = MediaSetController::new(
        LOCATOR,
        Arc::new(StaticRetrieval::new(vec![
            image.descriptor(&session),
            archive.descriptor(&session),
        ])),
        keyed_decryptor(&session),
        Arc::new(dispatcher(&renderer)),
        MediaConfig::default(),
    );
    let containers = [Container::new(), Container::new()];

    set.load(Some(&session)).await.unwrap();
    let outcomes = set
        .render_all(|key| Some(containers[key.index].clone()), Some(&session))
        .await;

    assert_eq!(outcomes[0].1, RenderOutcome::Succeeded);
    assert_eq!(outcomes[1].1, RenderOutcome::Failed);
    assert_eq!(
        containers[0].content(),
        Mounted::Media {
            name: "cat.png".into(),
            kind: MediaKind::Image,
        }
    );
    assert!(containers[1].is_fallback());
    assert_eq!(renderer.painted("cat.png").as_deref(), Some(image.plaintext()));
}

#[rstest]
#[tokio::test]
async fn torn_ciphertext_falls_back(_tracing_setup: (), session: SessionId) {
    let file = EncryptedFile::new("clip.mp4", payload(7, 2048))
        .with_chunk_size(100)
        .failing_after("peer disconnected");
    let renderer = CollectingRenderer::default();
    let set = MediaSetController::new(
        LOCATOR,
        Arc::new(StaticRetrieval::new(vec![file.descriptor(&session)])),
        keyed_decryptor(&session),
        Arc::new(dispatcher(&renderer)),
        MediaConfig::default(),
    );
    let container = Container::new();

    set.load(Some(&session)).await.unwrap();
    let outcomes = set
        .render_all(|_| Some(container.clone()), Some(&session))
        .await;

    assert_eq!(outcomes[0].1, RenderOutcome::Failed);
    assert!(container.is_fallback());
    assert!(renderer.painted("clip.mp4").is_none());
}

#[rstest]
#[tokio::test]
async fn ciphertext_for_other_session_is_rejected(_tracing_setup: (), session: SessionId) {
    let other = SessionId::new("!room-2:example.org").unwrap();
    let file = EncryptedFile::new("cat.png", payload(8, 500));
    let renderer = CollectingRenderer::default();
    let set = MediaSetController::new(
        LOCATOR,
        Arc::new(StaticRetrieval::new(vec![file.descriptor(&other)])),
        keyed_decryptor(&session),
        Arc::new(dispatcher(&renderer)),
        MediaConfig::default(),
    );
    let container = Container::new();

    set.load(Some(&session)).await.unwrap();
    let outcomes = set
        .render_all(|_| Some(container.clone()), Some(&session))
        .await;

    // A wrong key almost always breaks the padding; when it does not, the
    // renderer at least never sees the real plaintext.
    if outcomes[0].1 == RenderOutcome::Succeeded {
        assert_ne!(renderer.painted("cat.png").as_deref(), Some(file.plaintext()));
    } else {
        assert!(container.is_fallback());
    }
}
