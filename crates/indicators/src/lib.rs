//! Derived-series computation over ordered candle slices.
//!
//! Every function here is pure: it takes an ascending candle sequence
//! already filtered to one (symbol, timeframe) pair and returns an ordered
//! series of (time, value) points. Insufficient input yields an empty
//! series, which callers treat as "not yet renderable" rather than an
//! error.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod moving_average;
pub mod rsi;
pub mod zigzag;

pub use moving_average::{ema, ema_set, sma};
pub use rsi::rsi;
pub use zigzag::{Pivot, ZigZagSettings, zigzag};

/// One point of a derived series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}
