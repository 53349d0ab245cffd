use common::models::Candle;

use crate::IndicatorPoint;

/// Wilder's smoothed RSI over candle closes.
///
/// Needs at least `period + 1` candles. The first average gain/loss is a
/// simple mean over the first `period` deltas; every later delta updates
/// the averages with `avg = (avg * (period - 1) + current) / period`.
/// While the smoothed loss is exactly zero the ratio is undefined, so no
/// point is emitted for that bar (the averages still advance).
pub fn rsi(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() < period + 1 {
        return Vec::new();
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = candles[i].close - candles[i - 1].close;
        if delta >= 0.0 {
            avg_gain += delta;
        } else {
            avg_loss += -delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let mut out = Vec::with_capacity(candles.len() - period);
    push_point(&mut out, &candles[period], avg_gain, avg_loss);

    for i in (period + 1)..candles.len() {
        let delta = candles[i].close - candles[i - 1].close;
        let (gain, loss) = if delta >= 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        push_point(&mut out, &candles[i], avg_gain, avg_loss);
    }

    out
}

fn push_point(out: &mut Vec<IndicatorPoint>, candle: &Candle, avg_gain: f64, avg_loss: f64) {
    if avg_loss == 0.0 {
        return;
    }
    let rs = avg_gain / avg_loss;
    let value = 100.0 - 100.0 / (1.0 + rs);
    out.push(IndicatorPoint::new(candle.time, value));
}
