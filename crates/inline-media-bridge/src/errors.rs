use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("source stream failed: {0}")]
    Source(String),
    #[error("bridge cancelled")]
    Cancelled,
    #[error("bridge pump stopped before end of stream")]
    PumpStopped,
}
