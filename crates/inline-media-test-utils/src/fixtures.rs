use inline_media::SessionId;
use rstest::*;

#[fixture]
pub fn tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("warn".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

/// Session every fixture file is encrypted for.
#[fixture]
pub fn session() -> SessionId {
    SessionId::new("!room-1:example.org").unwrap()
}
