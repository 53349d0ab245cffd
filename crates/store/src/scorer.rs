/// Distance of the live price from a signal's entry, as a percentage of
/// the live price. Positive infinity when no usable quote exists; callers
/// render that as "not available" and it sorts last.
pub fn entry_distance(current_price: Option<f64>, entry_price: f64) -> f64 {
    match current_price {
        Some(current) if current > 0.0 && entry_price > 0.0 => {
            (current - entry_price).abs() / current * 100.0
        }
        _ => f64::INFINITY,
    }
}

/// Presentation buckets for the entry distance. The 1% / 3% thresholds
/// are a display concern but are fixed for reproducibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    Near,
    Moderate,
    Far,
    Unavailable,
}

pub fn classify(score: f64) -> Proximity {
    if !score.is_finite() {
        Proximity::Unavailable
    } else if score <= 1.0 {
        Proximity::Near
    } else if score <= 3.0 {
        Proximity::Moderate
    } else {
        Proximity::Far
    }
}
