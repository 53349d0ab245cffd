use serde::{Deserialize, Serialize};

/// Streaming connection state as exposed to consumers. `Reconnecting`
/// renders as a non-blocking indicator; `Failed` is terminal until the
/// selection changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamStatus {
    Idle,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed,
}

impl StreamStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, StreamStatus::Connected)
    }
}

/// The active (symbol, timeframe) pair. Changing it tears down the
/// current subscription and scopes swing retention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub symbol: String,
    pub timeframe: String,
}

impl Selection {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }

    pub fn matches(&self, symbol: &str, timeframe: &str) -> bool {
        self.symbol == symbol && self.timeframe == timeframe
    }
}
