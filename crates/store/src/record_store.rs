use std::collections::HashMap;

use tracing::debug;

use common::models::{Candle, QuoteUpdate, Signal, SwingPoint, SymbolQuote};
use common::status::{Selection, StreamStatus};

/// Retention bounds. The signal window and per-partition candle history
/// are presentation-driven caps, kept configurable.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub signal_cap: usize,
    pub candle_cap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            signal_cap: 1000,
            candle_cap: 5000,
        }
    }
}

/// The single writer-accessible shared resource: candles, signals, swings
/// and quotes merged from the stream. All mutations are idempotent under
/// duplicate delivery (same identity replaces in place) and bump the
/// version counter.
pub struct RecordStore {
    config: StoreConfig,
    selection: Selection,
    candles: HashMap<(String, String), Vec<Candle>>,
    signal_ids: Vec<String>,
    signals: HashMap<String, Signal>,
    latest_signal: Option<String>,
    swings: Vec<SwingPoint>,
    quotes: HashMap<String, SymbolQuote>,
    status: StreamStatus,
    version: u64,
}

impl RecordStore {
    pub fn new(selection: Selection, config: StoreConfig) -> Self {
        Self {
            config,
            selection,
            candles: HashMap::new(),
            signal_ids: Vec::new(),
            signals: HashMap::new(),
            latest_signal: None,
            swings: Vec::new(),
            quotes: HashMap::new(),
            status: StreamStatus::Idle,
            version: 0,
        }
    }

    /// Insert or replace a candle in its (symbol, timeframe) partition,
    /// keeping the partition strictly ascending by time.
    pub fn upsert_candle(&mut self, candle: Candle) {
        let key = (candle.symbol.clone(), candle.timeframe.clone());
        let partition = self.candles.entry(key).or_default();

        match partition.binary_search_by_key(&candle.time, |c| c.time) {
            Ok(i) => partition[i] = candle,
            Err(i) => partition.insert(i, candle),
        }

        if partition.len() > self.config.candle_cap {
            let excess = partition.len() - self.config.candle_cap;
            partition.drain(..excess);
        }

        debug_assert!(
            partition.windows(2).all(|w| w[0].time < w[1].time),
            "candle partition must stay strictly ascending"
        );
        self.bump();
    }

    /// Replace-or-append a swing point, then drop every retained point
    /// that belongs to a different (symbol, timeframe) pair. Retention is
    /// scoped to the chart being displayed, which bounds memory.
    pub fn append_swing(&mut self, swing: SwingPoint) {
        let pair = (swing.symbol.clone(), swing.timeframe.clone());

        if let Some(existing) = self.swings.iter_mut().find(|p| p.same_identity(&swing)) {
            *existing = swing;
        } else {
            self.swings.push(swing);
        }

        self.swings
            .retain(|p| p.symbol == pair.0 && p.timeframe == pair.1);
        self.bump();
    }

    /// Add a signal to the bounded newest-first window. A duplicate id
    /// replaces in place without disturbing the ordering. When the signal
    /// belongs to the selected symbol it also becomes the latest-signal
    /// slot consumed by chart auto-navigation.
    pub fn add_signal(&mut self, signal: Signal) {
        let id = signal.id.clone();
        let symbol = signal.symbol.clone();

        if self.signals.contains_key(&id) {
            self.signals.insert(id.clone(), signal);
        } else {
            self.signal_ids.insert(0, id.clone());
            self.signals.insert(id.clone(), signal);

            if self.signal_ids.len() > self.config.signal_cap {
                for evicted in self.signal_ids.split_off(self.config.signal_cap) {
                    self.signals.remove(&evicted);
                    debug!("Signal window full, evicted {evicted}");
                }
                if let Some(latest) = &self.latest_signal
                    && !self.signals.contains_key(latest)
                {
                    self.latest_signal = None;
                }
            }
        }

        if symbol == self.selection.symbol {
            self.latest_signal = Some(id);
        }
        self.bump();
    }

    /// Merge a partial quote update; absent fields keep their prior
    /// values.
    pub fn upsert_quote(&mut self, update: QuoteUpdate) {
        let quote = self
            .quotes
            .entry(update.symbol.clone())
            .or_insert_with(|| SymbolQuote {
                symbol: update.symbol.clone(),
                last_price: 0.0,
                change_24h: 0.0,
                market_cap: None,
            });

        if let Some(price) = update.last_price {
            quote.last_price = price;
        }
        if let Some(change) = update.change_24h {
            quote.change_24h = change;
        }
        if let Some(cap) = update.market_cap {
            quote.market_cap = Some(cap);
        }
        self.bump();
    }

    pub fn set_status(&mut self, status: StreamStatus) {
        self.status = status;
        self.bump();
    }

    /// Switch the active pair. Swings of other pairs are pruned right
    /// away and the latest-signal slot is recomputed for the new symbol.
    pub fn set_selection(&mut self, selection: Selection) {
        self.swings
            .retain(|p| selection.matches(&p.symbol, &p.timeframe));
        self.latest_signal = self
            .signal_ids
            .iter()
            .find(|id| {
                self.signals
                    .get(*id)
                    .is_some_and(|s| s.symbol == selection.symbol)
            })
            .cloned();
        self.selection = selection;
        self.bump();
    }

    /// Clear candles, swings and signals; the selection and quote map
    /// survive so the UI keeps its context.
    pub fn reset(&mut self) {
        self.candles.clear();
        self.swings.clear();
        self.signal_ids.clear();
        self.signals.clear();
        self.latest_signal = None;
        self.bump();
    }

    pub fn candles(&self, symbol: &str, timeframe: &str) -> &[Candle] {
        self.candles
            .get(&(symbol.to_string(), timeframe.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Owned copy of a partition, for computation that runs off the lock.
    pub fn candle_snapshot(&self, symbol: &str, timeframe: &str) -> Vec<Candle> {
        self.candles(symbol, timeframe).to_vec()
    }

    /// Signal ids, newest first.
    pub fn signal_ids(&self) -> &[String] {
        &self.signal_ids
    }

    pub fn signal(&self, id: &str) -> Option<&Signal> {
        self.signals.get(id)
    }

    pub fn signals(&self) -> &HashMap<String, Signal> {
        &self.signals
    }

    pub fn latest_signal(&self) -> Option<&Signal> {
        self.latest_signal.as_deref().and_then(|id| self.signals.get(id))
    }

    pub fn swings(&self) -> &[SwingPoint] {
        &self.swings
    }

    pub fn quotes(&self) -> &HashMap<String, SymbolQuote> {
        &self.quotes
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Bumped on every mutation; consumers use it to decide when a
    /// derived view needs recomputing.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}
