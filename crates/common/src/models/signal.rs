use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

/// A swing level attached to a signal (price plus the bar it was taken from).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingLevel {
    pub price: f64,
    pub time: DateTime<Utc>,
}

/// A trading signal. Identity is `id`; signals are immutable once created.
///
/// Field set mirrors the alert generator's output: price at generation,
/// optional entry zone, stop loss, up to three take profits, the swing
/// levels the setup was derived from and a confluence count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub timeframe: String,
    pub direction: Direction,
    pub time: DateTime<Utc>,
    pub price: f64,
    pub entry1: Option<f64>,
    pub entry2: Option<f64>,
    pub stop_loss: Option<f64>,
    pub tp1: Option<f64>,
    pub tp2: Option<f64>,
    pub tp3: Option<f64>,
    pub swing_high: Option<SwingLevel>,
    pub swing_low: Option<SwingLevel>,
    pub confluence: Option<i64>,
}

impl Signal {
    /// Price used for entry-distance scoring and entry-price sorting:
    /// entry1 when the signal carries an entry zone, otherwise the
    /// generation price.
    pub fn entry_price(&self) -> f64 {
        self.entry1.unwrap_or(self.price)
    }

    /// Most recent of the two swing level instants, as epoch millis.
    /// Signals without swing levels sort as 0.
    pub fn swing_time_millis(&self) -> i64 {
        let high = self.swing_high.map(|s| s.time.timestamp_millis());
        let low = self.swing_low.map(|s| s.time.timestamp_millis());
        high.max(low).unwrap_or(0)
    }
}
