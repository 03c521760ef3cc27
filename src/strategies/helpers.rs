//! Common helpers shared across strategy modules
//!
//! Percentage helpers return `None` instead of dividing by zero; callers treat
//! `None` as "condition not met".

use crate::Candle;

/// Trailing `n` candles (all of them when fewer exist)
#[inline]
pub fn trailing(candles: &[Candle], n: usize) -> &[Candle] {
    &candles[candles.len().saturating_sub(n)..]
}

/// `part / whole * 100`, or `None` for a zero or non-finite denominator
#[inline]
pub fn percent_of(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 || !whole.is_finite() {
        return None;
    }
    let pct = part / whole * 100.0;
    pct.is_finite().then_some(pct)
}

/// Percent change from `from` to `to`
#[inline]
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    percent_of(to - from, from)
}

/// Body size as a percentage of the open
#[inline]
pub fn body_percent(candle: &Candle) -> Option<f64> {
    percent_of(candle.body(), candle.open)
}

#[inline]
pub fn max_high(candles: &[Candle]) -> f64 {
    candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max)
}

#[inline]
pub fn min_low(candles: &[Candle]) -> f64 {
    candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min)
}

#[inline]
pub fn max_close(candles: &[Candle]) -> f64 {
    candles.iter().map(|c| c.close).fold(f64::NEG_INFINITY, f64::max)
}

#[inline]
pub fn min_close(candles: &[Candle]) -> f64 {
    candles.iter().map(|c| c.close).fold(f64::INFINITY, f64::min)
}

/// Closes strictly fall on every step of `candles[from..=to]`
pub fn closes_strictly_falling(candles: &[Candle], from: usize, to: usize) -> bool {
    candles[from..=to].windows(2).all(|w| w[1].close < w[0].close)
}

/// Closes strictly rise on every step of `candles[from..=to]`
pub fn closes_strictly_rising(candles: &[Candle], from: usize, to: usize) -> bool {
    candles[from..=to].windows(2).all(|w| w[1].close > w[0].close)
}
