//! Bytes survive the bridge unchanged for any chunking and buffer size.

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt, channel::mpsc};
use inline_media::bridge::{
    BridgeError, BridgeEvent, BridgeOptions, ByteStreamSource, StreamBridge,
};
use inline_media_test_utils::{MemoryStream, Xorshift64, payload, tracing_setup};
use rstest::rstest;
use tokio::io::AsyncReadExt;

fn random_chunks(data: &[u8], seed: u64) -> Vec<Bytes> {
    let mut rng = Xorshift64::new(seed);
    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let len = rng.range_usize(1, 257).min(data.len() - pos);
        chunks.push(Bytes::copy_from_slice(&data[pos..pos + len]));
        pos += len;
    }
    chunks
}

#[rstest]
#[case::roomy(1024 * 1024)]
#[case::one_chunk(256)]
#[case::single_byte(1)]
#[tokio::test]
async fn events_carry_every_byte_in_order(
    _tracing_setup: (),
    #[values(1, 2, 3)] seed: u64,
    #[case] max_buffer_bytes: usize,
) {
    let data = payload(seed, 10_000);
    let source = ByteStreamSource::new(futures::stream::iter(
        random_chunks(&data, seed)
            .into_iter()
            .map(Ok::<_, std::io::Error>),
    ));
    let mut reader = StreamBridge::new(
        BridgeOptions::default()
            .with_max_buffer_bytes(max_buffer_bytes)
            .with_channel_capacity(2),
    )
    .wrap(source);

    let mut out = Vec::new();
    let mut ended = false;
    while let Some(event) = reader.next().await {
        assert!(!ended, "event after End");
        match event {
            BridgeEvent::Data(chunk) => out.extend_from_slice(&chunk),
            BridgeEvent::End => ended = true,
            BridgeEvent::Error(e) => panic!("unexpected error: {e}"),
        }
    }

    assert!(ended);
    assert_eq!(out, data);
}

#[rstest]
#[tokio::test]
async fn slow_producer_fast_consumer(_tracing_setup: ()) {
    let data = payload(11, 4096);
    let (mut tx, rx) = mpsc::channel::<Result<Bytes, String>>(1);
    let producer = {
        let data = data.clone();
        tokio::spawn(async move {
            for chunk in data.chunks(100) {
                tokio::time::sleep(Duration::from_millis(1)).await;
                tx.send(Ok(Bytes::copy_from_slice(chunk))).await.unwrap();
            }
        })
    };
    let mut reader = StreamBridge::default().wrap(ByteStreamSource::new(rx));

    let mut out = Vec::new();
    reader.read_to_end(&mut out).await.unwrap();
    producer.await.unwrap();

    assert_eq!(out, data);
}

#[rstest]
#[tokio::test]
async fn failure_after_data_keeps_prefix_and_ends_silently(_tracing_setup: ()) {
    let data = payload(12, 1000);
    let source = MemoryStream::new(data.clone(), 64).failing_after("socket closed");
    let mut reader = StreamBridge::default().wrap(source);

    let mut out = Vec::new();
    let mut error = None;
    while let Some(event) = reader.next().await {
        match event {
            BridgeEvent::Data(chunk) => out.extend_from_slice(&chunk),
            BridgeEvent::End => panic!("End after a failing source"),
            BridgeEvent::Error(e) => error = Some(e),
        }
    }

    assert_eq!(out, data);
    assert_eq!(error, Some(BridgeError::Source("socket closed".into())));
    assert!(reader.next().await.is_none());
}

#[rstest]
#[tokio::test]
async fn dropping_reader_mid_stream_cancels_source(_tracing_setup: ()) {
    let source = MemoryStream::new(payload(13, 64 * 1024), 16);
    let cancelled = source.cancelled_flag();
    let mut reader = StreamBridge::new(BridgeOptions::default().with_max_buffer_bytes(32))
        .wrap(source);

    assert!(matches!(reader.next().await, Some(BridgeEvent::Data(_))));
    drop(reader);

    tokio::time::timeout(Duration::from_secs(1), async {
        while !cancelled.load(std::sync::atomic::Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
}
