use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    bridge::BridgeMsg,
    sync::BufferTracker,
    web::{ReadResult, WebReadableStream},
};

/// Pull from `source` and push into the reader's channel until the source
/// ends, fails, or the bridge is cancelled.
pub(crate) async fn pump<R: WebReadableStream>(
    mut source: R,
    tx: mpsc::Sender<BridgeMsg>,
    tracker: Arc<BufferTracker>,
    cancel: CancellationToken,
) {
    trace!("bridge pump started");
    let mut total: u64 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tracker.wait_for_room() => {}
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = source.read() => result,
        };

        match result {
            Ok(ReadResult::Chunk(bytes)) => {
                if bytes.is_empty() {
                    continue;
                }
                let len = bytes.len();
                tracker.reserve(len);
                if tx.send(BridgeMsg::Data(bytes)).await.is_err() {
                    tracker.release(len);
                    break;
                }
                total = total.saturating_add(len as u64);
                trace!(bytes = len, total, "bridge pump pushed chunk");
            }
            Ok(ReadResult::Done) => {
                debug!(total, "bridge pump reached end of stream");
                let _ = tx.send(BridgeMsg::EndOfStream).await;
                return;
            }
            Err(e) => {
                warn!(error = %e, total, "bridge source failed");
                let _ = tx.send(BridgeMsg::Error(e.to_string())).await;
                return;
            }
        }
    }

    source.cancel("bridge closed").await;
    debug!(total, "bridge pump cancelled");
}
