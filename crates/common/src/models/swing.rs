use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

/// A chart swing point. Identity is (symbol, timeframe, time, kind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub symbol: String,
    pub timeframe: String,
    pub time: DateTime<Utc>,
    pub kind: SwingKind,
    pub price: f64,
}

impl SwingPoint {
    pub fn same_identity(&self, other: &SwingPoint) -> bool {
        self.symbol == other.symbol
            && self.timeframe == other.timeframe
            && self.time == other.time
            && self.kind == other.kind
    }
}
