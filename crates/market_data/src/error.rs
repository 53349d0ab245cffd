use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to decode stream frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid stream payload: {0}")]
    InvalidPayload(String),

    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("retry budget exhausted after {attempts} attempts")]
    RetryBudgetExhausted { attempts: u32 },
}
