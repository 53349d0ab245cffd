use std::cmp::Ordering;
use std::collections::HashMap;

use common::models::{Direction, Signal, SymbolQuote};

use crate::scorer::entry_distance;

/// At most this many sort keys are applied; extra keys are ignored.
pub const MAX_SORT_KEYS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionFilter {
    #[default]
    All,
    Long,
    Short,
}

impl DirectionFilter {
    fn matches(&self, direction: Direction) -> bool {
        match self {
            DirectionFilter::All => true,
            DirectionFilter::Long => direction == Direction::Long,
            DirectionFilter::Short => direction == Direction::Short,
        }
    }
}

/// Live filter over the signal list: case-insensitive substring match on
/// the symbol plus an exact direction match.
#[derive(Debug, Clone, Default)]
pub struct SignalFilter {
    pub search: String,
    pub direction: DirectionFilter,
}

impl SignalFilter {
    pub fn matches(&self, signal: &Signal) -> bool {
        if !self.direction.matches(signal.direction) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        signal
            .symbol
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    SwingTime,
    PriceScore,
    Confluence,
    Symbol,
    EntryPrice,
    SignalTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub dir: SortDir,
}

impl SortKey {
    pub fn new(field: SortField, dir: SortDir) -> Self {
        Self { field, dir }
    }

    fn compare(
        &self,
        a: &Signal,
        b: &Signal,
        quotes: &HashMap<String, SymbolQuote>,
    ) -> Ordering {
        let ord = match self.field {
            SortField::SwingTime => a.swing_time_millis().cmp(&b.swing_time_millis()),
            SortField::PriceScore => score_of(a, quotes).total_cmp(&score_of(b, quotes)),
            SortField::Confluence => a.confluence.unwrap_or(0).cmp(&b.confluence.unwrap_or(0)),
            SortField::Symbol => a.symbol.to_lowercase().cmp(&b.symbol.to_lowercase()),
            SortField::EntryPrice => a.entry_price().total_cmp(&b.entry_price()),
            SortField::SignalTime => a.time.cmp(&b.time),
        };
        match self.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    }
}

fn score_of(signal: &Signal, quotes: &HashMap<String, SymbolQuote>) -> f64 {
    let current = quotes.get(&signal.symbol).map(|q| q.last_price);
    entry_distance(current, signal.entry_price())
}

/// Filter and sort a signal id list. Pure: identical inputs produce an
/// identical ordering, and the sort is stable so ties keep input order.
pub fn compute_view(
    ids: &[String],
    filter: &SignalFilter,
    sort: &[SortKey],
    lookup: &HashMap<String, Signal>,
    quotes: &HashMap<String, SymbolQuote>,
) -> Vec<String> {
    let mut view: Vec<&String> = ids
        .iter()
        .filter(|id| lookup.get(*id).is_some_and(|s| filter.matches(s)))
        .collect();

    let keys = &sort[..sort.len().min(MAX_SORT_KEYS)];
    if !keys.is_empty() {
        view.sort_by(|a, b| {
            let (sa, sb) = (&lookup[*a], &lookup[*b]);
            for key in keys {
                let ord = key.compare(sa, sb, quotes);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    view.into_iter().cloned().collect()
}

/// Freeze support: while frozen the captured ordering is replayed and
/// only the live filter is applied to it, so ids can disappear but never
/// reorder or reappear while the user inspects the list.
#[derive(Debug, Default)]
pub struct ViewState {
    frozen: Option<Vec<String>>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the full current ordering (unfiltered view order).
    pub fn freeze(&mut self, ordered_ids: Vec<String>) {
        self.frozen = Some(ordered_ids);
    }

    pub fn unfreeze(&mut self) {
        self.frozen = None;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn render(
        &self,
        ids: &[String],
        filter: &SignalFilter,
        sort: &[SortKey],
        lookup: &HashMap<String, Signal>,
        quotes: &HashMap<String, SymbolQuote>,
    ) -> Vec<String> {
        match &self.frozen {
            Some(frozen) => frozen
                .iter()
                .filter(|id| lookup.get(*id).is_some_and(|s| filter.matches(s)))
                .cloned()
                .collect(),
            None => compute_view(ids, filter, sort, lookup, quotes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::models::SwingLevel;

    fn signal(id: &str, symbol: &str, direction: Direction, secs: i64) -> Signal {
        Signal {
            id: id.to_string(),
            symbol: symbol.to_string(),
            timeframe: "1h".to_string(),
            direction,
            time: Utc.timestamp_opt(secs, 0).unwrap(),
            price: 100.0,
            entry1: None,
            entry2: None,
            stop_loss: None,
            tp1: None,
            tp2: None,
            tp3: None,
            swing_high: None,
            swing_low: None,
            confluence: None,
        }
    }

    fn quote(symbol: &str, price: f64) -> SymbolQuote {
        SymbolQuote {
            symbol: symbol.to_string(),
            last_price: price,
            change_24h: 0.0,
            market_cap: None,
        }
    }

    fn index(signals: Vec<Signal>) -> (Vec<String>, HashMap<String, Signal>) {
        let ids = signals.iter().map(|s| s.id.clone()).collect();
        let lookup = signals.into_iter().map(|s| (s.id.clone(), s)).collect();
        (ids, lookup)
    }

    #[test]
    fn search_is_case_insensitive_substring_on_symbol() {
        let (ids, lookup) = index(vec![
            signal("a", "BTCUSDT", Direction::Long, 1),
            signal("b", "ETHUSDT", Direction::Long, 2),
            signal("c", "ETHBTC", Direction::Long, 3),
        ]);
        let filter = SignalFilter {
            search: "btc".to_string(),
            direction: DirectionFilter::All,
        };
        let out = compute_view(&ids, &filter, &[], &lookup, &HashMap::new());
        assert_eq!(out, vec!["a", "c"]);
    }

    #[test]
    fn direction_filter_is_exact() {
        let (ids, lookup) = index(vec![
            signal("a", "BTCUSDT", Direction::Long, 1),
            signal("b", "BTCUSDT", Direction::Short, 2),
        ]);
        let filter = SignalFilter {
            search: String::new(),
            direction: DirectionFilter::Short,
        };
        let out = compute_view(&ids, &filter, &[], &lookup, &HashMap::new());
        assert_eq!(out, vec!["b"]);
    }

    #[test]
    fn multi_key_sort_applies_keys_lexicographically() {
        let mut a = signal("a", "ETHUSDT", Direction::Long, 10);
        a.confluence = Some(2);
        let mut b = signal("b", "BTCUSDT", Direction::Long, 20);
        b.confluence = Some(2);
        let mut c = signal("c", "ADAUSDT", Direction::Long, 30);
        c.confluence = Some(3);
        let (ids, lookup) = index(vec![a, b, c]);

        // Primary: confluence desc; secondary: symbol asc.
        let sort = [
            SortKey::new(SortField::Confluence, SortDir::Desc),
            SortKey::new(SortField::Symbol, SortDir::Asc),
        ];
        let out = compute_view(&ids, &SignalFilter::default(), &sort, &lookup, &HashMap::new());
        assert_eq!(out, vec!["c", "b", "a"]);
    }

    #[test]
    fn sort_is_stable_for_tied_keys() {
        let (ids, lookup) = index(vec![
            signal("first", "BTCUSDT", Direction::Long, 5),
            signal("second", "BTCUSDT", Direction::Long, 5),
            signal("third", "BTCUSDT", Direction::Long, 5),
        ]);
        let sort = [
            SortKey::new(SortField::SignalTime, SortDir::Asc),
            SortKey::new(SortField::Symbol, SortDir::Asc),
            SortKey::new(SortField::Confluence, SortDir::Desc),
        ];
        let out = compute_view(&ids, &SignalFilter::default(), &sort, &lookup, &HashMap::new());
        assert_eq!(out, vec!["first", "second", "third"]);
    }

    #[test]
    fn signals_without_a_live_quote_sort_last_on_price_score() {
        let quoted = signal("quoted", "BTCUSDT", Direction::Long, 1);
        let unquoted = signal("unquoted", "NOQUOTE", Direction::Long, 2);
        let (ids, lookup) = index(vec![unquoted, quoted]);
        let quotes = HashMap::from([("BTCUSDT".to_string(), quote("BTCUSDT", 101.0))]);

        let sort = [SortKey::new(SortField::PriceScore, SortDir::Asc)];
        let out = compute_view(&ids, &SignalFilter::default(), &sort, &lookup, &quotes);
        assert_eq!(out, vec!["quoted", "unquoted"]);
    }

    #[test]
    fn swing_time_key_uses_newest_swing_and_defaults_to_zero() {
        let mut late = signal("late", "BTCUSDT", Direction::Long, 1);
        late.swing_high = Some(SwingLevel {
            price: 1.0,
            time: Utc.timestamp_opt(900, 0).unwrap(),
        });
        late.swing_low = Some(SwingLevel {
            price: 1.0,
            time: Utc.timestamp_opt(2000, 0).unwrap(),
        });
        let mut early = signal("early", "BTCUSDT", Direction::Long, 2);
        early.swing_low = Some(SwingLevel {
            price: 1.0,
            time: Utc.timestamp_opt(1000, 0).unwrap(),
        });
        let bare = signal("bare", "BTCUSDT", Direction::Long, 3);
        let (ids, lookup) = index(vec![late, early, bare]);

        let sort = [SortKey::new(SortField::SwingTime, SortDir::Desc)];
        let out = compute_view(&ids, &SignalFilter::default(), &sort, &lookup, &HashMap::new());
        assert_eq!(out, vec!["late", "early", "bare"]);
    }

    #[test]
    fn only_the_first_three_sort_keys_apply() {
        let (ids, lookup) = index(vec![
            signal("a", "AAAUSDT", Direction::Long, 1),
            signal("b", "BBBUSDT", Direction::Long, 1),
        ]);
        // Three tying keys followed by a fourth that would reverse the
        // order if it were applied.
        let sort = [
            SortKey::new(SortField::SignalTime, SortDir::Asc),
            SortKey::new(SortField::Confluence, SortDir::Asc),
            SortKey::new(SortField::SwingTime, SortDir::Asc),
            SortKey::new(SortField::Symbol, SortDir::Desc),
        ];
        let out = compute_view(&ids, &SignalFilter::default(), &sort, &lookup, &HashMap::new());
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn frozen_view_only_ever_removes_ids() {
        let (ids, lookup) = index(vec![
            signal("a", "BTCUSDT", Direction::Long, 3),
            signal("b", "ETHUSDT", Direction::Long, 2),
            signal("c", "BTCBULL", Direction::Long, 1),
        ]);
        let sort = [SortKey::new(SortField::SignalTime, SortDir::Asc)];
        let quotes = HashMap::new();

        let mut state = ViewState::new();
        let live = state.render(&ids, &SignalFilter::default(), &sort, &lookup, &quotes);
        assert_eq!(live, vec!["c", "b", "a"]);

        state.freeze(live.clone());

        // Narrowing the filter removes ids but keeps the frozen order.
        let narrowed = state.render(
            &ids,
            &SignalFilter {
                search: "btc".to_string(),
                direction: DirectionFilter::All,
            },
            &sort,
            &lookup,
            &quotes,
        );
        assert_eq!(narrowed, vec!["c", "a"]);

        // New sort keys are ignored while frozen.
        let resorted = state.render(
            &ids,
            &SignalFilter::default(),
            &[SortKey::new(SortField::SignalTime, SortDir::Desc)],
            &lookup,
            &quotes,
        );
        assert_eq!(resorted, vec!["c", "b", "a"]);

        state.unfreeze();
        let live_again = state.render(
            &ids,
            &SignalFilter::default(),
            &[SortKey::new(SortField::SignalTime, SortDir::Desc)],
            &lookup,
            &quotes,
        );
        assert_eq!(live_again, vec!["a", "b", "c"]);
    }
}
