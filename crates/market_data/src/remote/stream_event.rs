use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use common::models::{Candle, Direction, QuoteUpdate, Signal, SwingKind, SwingLevel, SwingPoint};

use crate::error::TransportError;

/// One inbound frame from the stream, a closed tagged union. Unknown
/// tags land on `Unrecognized` instead of matching a wrong case.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Signal {
        data: SignalEvent,
    },
    Candle {
        data: CandleEvent,
    },
    Swing {
        data: SwingEvent,
    },
    SymbolUpdate {
        data: QuoteEvent,
    },
    MarketcapUpdate {
        data: QuoteEvent,
    },
    /// Server-side indicator frames are opaque to this client.
    Indicator {
        data: Value,
    },
    Connected {
        #[serde(default)]
        message: Option<String>,
    },
    Subscribed {
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        timeframe: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

pub fn decode_frame(text: &str) -> Result<StreamFrame, TransportError> {
    Ok(serde_json::from_str(text)?)
}

fn millis_to_utc(millis: i64) -> Result<DateTime<Utc>, TransportError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| TransportError::InvalidPayload(format!("bad timestamp {millis}")))
}

#[derive(Debug, Deserialize)]
pub struct CandleEvent {
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: i64,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl CandleEvent {
    pub fn to_domain(&self) -> Result<Candle, TransportError> {
        Ok(Candle {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            time: millis_to_utc(self.timestamp)?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SwingEvent {
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: SwingKind,
    pub price: f64,
}

impl SwingEvent {
    pub fn to_domain(&self) -> Result<SwingPoint, TransportError> {
        Ok(SwingPoint {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            time: millis_to_utc(self.timestamp)?,
            kind: self.kind,
            price: self.price,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SignalEvent {
    pub id: String,
    pub symbol: String,
    pub timeframe: String,
    pub direction: Direction,
    pub timestamp: i64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub entry1: Option<f64>,
    #[serde(default)]
    pub entry2: Option<f64>,
    #[serde(default)]
    pub sl: Option<f64>,
    #[serde(default)]
    pub tp1: Option<f64>,
    #[serde(default)]
    pub tp2: Option<f64>,
    #[serde(default)]
    pub tp3: Option<f64>,
    #[serde(default)]
    pub swing_high: Option<f64>,
    #[serde(default)]
    pub swing_high_timestamp: Option<i64>,
    #[serde(default)]
    pub swing_low: Option<f64>,
    #[serde(default)]
    pub swing_low_timestamp: Option<i64>,
    /// Arrives as a JSON number or a numeric string depending on the
    /// producer; parsed late like the rest of the loosely typed fields.
    #[serde(default)]
    pub confluence: Option<Value>,
}

impl SignalEvent {
    pub fn to_domain(&self) -> Result<Signal, TransportError> {
        Ok(Signal {
            id: self.id.clone(),
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            direction: self.direction,
            time: millis_to_utc(self.timestamp)?,
            price: self.price,
            entry1: self.entry1,
            entry2: self.entry2,
            stop_loss: self.sl,
            tp1: self.tp1,
            tp2: self.tp2,
            tp3: self.tp3,
            swing_high: swing_level(self.swing_high, self.swing_high_timestamp)?,
            swing_low: swing_level(self.swing_low, self.swing_low_timestamp)?,
            confluence: self.confluence.as_ref().and_then(parse_confluence),
        })
    }
}

fn swing_level(
    price: Option<f64>,
    timestamp: Option<i64>,
) -> Result<Option<SwingLevel>, TransportError> {
    match (price, timestamp) {
        (Some(price), Some(millis)) => Ok(Some(SwingLevel {
            price,
            time: millis_to_utc(millis)?,
        })),
        _ => Ok(None),
    }
}

fn parse_confluence(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteEvent {
    pub symbol: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl QuoteEvent {
    pub fn to_domain(&self) -> QuoteUpdate {
        QuoteUpdate {
            symbol: self.symbol.clone(),
            last_price: self.price,
            change_24h: self.change_24h,
            market_cap: self.market_cap,
        }
    }
}
