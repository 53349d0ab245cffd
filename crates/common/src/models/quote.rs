use serde::{Deserialize, Serialize};

/// Latest known market data for a symbol. Continuously overwritten by
/// streaming updates; the source of truth for entry-distance scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolQuote {
    pub symbol: String,
    pub last_price: f64,
    pub change_24h: f64,
    pub market_cap: Option<f64>,
}

/// Partial quote update; absent fields leave the stored values untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteUpdate {
    pub symbol: String,
    pub last_price: Option<f64>,
    pub change_24h: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Symbol metadata returned by the REST symbols endpoint, used to
/// populate the selection UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMeta {
    pub symbol: String,
    pub timeframes: Vec<String>,
}
