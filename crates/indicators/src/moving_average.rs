use common::models::Candle;

use crate::IndicatorPoint;

/// Simple moving average of closes: one output per bar once `period`
/// closes are available.
pub fn sma(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(candles.len() - period + 1);
    let mut window_sum: f64 = candles[..period].iter().map(|c| c.close).sum();
    out.push(IndicatorPoint::new(
        candles[period - 1].time,
        window_sum / period as f64,
    ));

    for i in period..candles.len() {
        window_sum += candles[i].close - candles[i - period].close;
        out.push(IndicatorPoint::new(candles[i].time, window_sum / period as f64));
    }

    out
}

/// Exponential moving average of closes, seeded with the SMA of the first
/// `period` closes (emitted at that bar) and smoothed with
/// `alpha = 2 / (period + 1)` from then on.
pub fn ema(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed: f64 = candles[..period].iter().map(|c| c.close).sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(candles.len() - period + 1);
    out.push(IndicatorPoint::new(candles[period - 1].time, seed));

    let mut prev = seed;
    for candle in &candles[period..] {
        prev = alpha * candle.close + (1.0 - alpha) * prev;
        out.push(IndicatorPoint::new(candle.time, prev));
    }

    out
}

/// Independent EMA series for several periods (20/50/100/200 style) off
/// the same candle input. Periods the input is too short for come back
/// empty like any other insufficient-data case.
pub fn ema_set(candles: &[Candle], periods: &[usize]) -> Vec<(usize, Vec<IndicatorPoint>)> {
    periods.iter().map(|&p| (p, ema(candles, p))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::candles_from_closes;

    #[test]
    fn sma_is_trailing_mean() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = sma(&candles, 3);
        let values: Vec<f64> = out.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(out[0].time, candles[2].time);
    }

    #[test]
    fn sma_short_input_is_empty() {
        let candles = candles_from_closes(&[1.0, 2.0]);
        assert!(sma(&candles, 3).is_empty());
    }

    #[test]
    fn ema_period_three_reference_sequence() {
        // seed = mean(1,2,3) = 2 at index 2; alpha = 0.5:
        // index 3 = 0.5*4 + 0.5*2 = 3; index 4 = 0.5*5 + 0.5*3 = 4.
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = ema(&candles, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].time, candles[2].time);
        assert!((out[0].value - 2.0).abs() < 1e-12);
        assert_eq!(out[1].time, candles[3].time);
        assert!((out[1].value - 3.0).abs() < 1e-12);
        assert_eq!(out[2].time, candles[4].time);
        assert!((out[2].value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn ema_set_runs_each_period_independently() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let set = ema_set(&candles, &[3, 5, 200]);
        assert_eq!(set.len(), 3);
        assert_eq!(set[0].0, 3);
        assert_eq!(set[0].1.len(), 3);
        assert_eq!(set[1].1.len(), 1);
        // Not enough history for the 200 period yet.
        assert!(set[2].1.is_empty());
    }
}
