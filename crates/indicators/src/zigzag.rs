use chrono::{DateTime, Utc};
use common::models::Candle;

/// ZigZag parameters. `min_tick` is deliberately a parameter rather than
/// being derived per instrument; the defaults match the charting preset
/// (depth 12, deviation 5, backstep 2, tick 0.01).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZigZagSettings {
    pub depth: usize,
    pub deviation: f64,
    pub backstep: usize,
    pub min_tick: f64,
}

impl Default for ZigZagSettings {
    fn default() -> Self {
        Self {
            depth: 12,
            deviation: 5.0,
            backstep: 2,
            min_tick: 0.01,
        }
    }
}

/// One accepted ZigZag pivot. Consecutive pivots always alternate
/// between highs and lows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub index: usize,
    pub time: DateTime<Utc>,
    pub price: f64,
    pub is_high: bool,
}

/// Detect alternating local extrema over an ascending candle sequence.
///
/// A bar becomes a candidate when it holds the extreme of the trailing
/// `depth` window itself (no lookahead) and the window's high-to-low range
/// exceeds `deviation * min_tick`. Candidates are then reduced to strictly
/// alternating pivots: a same-polarity candidate replaces the last pivot
/// only when more extreme, an opposite-polarity candidate is accepted only
/// `backstep` or more bars after the last pivot.
pub fn zigzag(candles: &[Candle], settings: &ZigZagSettings) -> Vec<Pivot> {
    let depth = settings.depth;
    if depth == 0 || candles.len() <= depth {
        return Vec::new();
    }

    let threshold = settings.deviation * settings.min_tick;
    let mut pivots: Vec<Pivot> = Vec::new();

    for i in depth..candles.len() {
        let window = &candles[i - depth..=i];
        let win_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let win_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        if win_high - win_low <= threshold {
            continue;
        }

        let bar = &candles[i];
        if bar.high >= win_high {
            accept(
                &mut pivots,
                Pivot {
                    index: i,
                    time: bar.time,
                    price: bar.high,
                    is_high: true,
                },
                settings.backstep,
            );
        }
        if bar.low <= win_low {
            accept(
                &mut pivots,
                Pivot {
                    index: i,
                    time: bar.time,
                    price: bar.low,
                    is_high: false,
                },
                settings.backstep,
            );
        }
    }

    pivots
}

fn accept(pivots: &mut Vec<Pivot>, candidate: Pivot, backstep: usize) {
    match pivots.last_mut() {
        None => pivots.push(candidate),
        Some(last) if last.is_high == candidate.is_high => {
            let more_extreme = if candidate.is_high {
                candidate.price > last.price
            } else {
                candidate.price < last.price
            };
            if more_extreme {
                *last = candidate;
            }
        }
        Some(last) => {
            if candidate.index - last.index >= backstep {
                pivots.push(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::candles_from_ranges;

    fn settings(depth: usize, backstep: usize) -> ZigZagSettings {
        ZigZagSettings {
            depth,
            backstep,
            deviation: 5.0,
            min_tick: 0.01,
        }
    }

    #[test]
    fn short_input_is_empty() {
        let candles = candles_from_ranges(&[(1.0, 0.9), (1.2, 1.1)]);
        assert!(zigzag(&candles, &settings(2, 2)).is_empty());
        assert!(zigzag(&candles, &settings(0, 2)).is_empty());
    }

    #[test]
    fn flat_range_below_deviation_yields_no_pivots() {
        // Range 0.02 never clears the 5 * 0.01 threshold.
        let candles = candles_from_ranges(&[(1.0, 0.98); 20]);
        assert!(zigzag(&candles, &settings(2, 2)).is_empty());
    }

    #[test]
    fn detects_alternating_extremes() {
        let candles = candles_from_ranges(&[
            (1.0, 0.9),
            (1.2, 1.1),
            (1.5, 1.4),  // swing high
            (1.3, 1.2),
            (1.0, 0.8),  // swing low
            (1.1, 0.95),
            (1.6, 1.5),  // swing high
        ]);
        let pivots = zigzag(&candles, &settings(2, 2));
        let shape: Vec<(usize, bool, f64)> =
            pivots.iter().map(|p| (p.index, p.is_high, p.price)).collect();
        assert_eq!(
            shape,
            vec![(2, true, 1.5), (4, false, 0.8), (6, true, 1.6)]
        );
    }

    #[test]
    fn output_strictly_alternates() {
        // A noisy walk; whatever comes out, polarity must flip each step.
        let candles = candles_from_ranges(&[
            (1.0, 0.9),
            (1.4, 1.3),
            (1.2, 0.7),
            (1.5, 1.1),
            (0.9, 0.6),
            (1.7, 1.4),
            (1.3, 0.5),
            (1.9, 1.6),
            (1.1, 0.4),
            (2.0, 1.8),
        ]);
        let pivots = zigzag(&candles, &settings(2, 2));
        assert!(!pivots.is_empty());
        for pair in pivots.windows(2) {
            assert_ne!(pair[0].is_high, pair[1].is_high);
        }
    }

    #[test]
    fn same_polarity_candidate_replaces_only_when_more_extreme() {
        let candles = candles_from_ranges(&[
            (1.0, 0.9),
            (1.2, 1.1),
            (1.5, 1.4),  // first high candidate
            (1.7, 1.6),  // higher high, replaces it
        ]);
        let pivots = zigzag(&candles, &settings(2, 2));
        assert_eq!(pivots.len(), 1);
        assert!(pivots[0].is_high);
        assert_eq!(pivots[0].index, 3);
        assert!((pivots[0].price - 1.7).abs() < 1e-12);
    }

    #[test]
    fn opposite_candidate_inside_backstep_is_discarded() {
        let candles = candles_from_ranges(&[
            (1.0, 0.9),
            (1.5, 1.4),   // high pivot
            (1.2, 0.7),   // low 1 bar later: inside backstep, dropped
            (0.9, 0.65),  // low 2 bars later: still inside, dropped
            (0.8, 0.6),   // low 3 bars later: accepted
        ]);
        let pivots = zigzag(&candles, &settings(1, 3));
        let shape: Vec<(usize, bool)> = pivots.iter().map(|p| (p.index, p.is_high)).collect();
        assert_eq!(shape, vec![(1, true), (4, false)]);
    }
}
