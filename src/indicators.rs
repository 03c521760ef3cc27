//! Moving averages and the volatility/acceleration checks built on them.
//!
//! Two window conventions are provided:
//! - [`simple_moving_average`] uses a *partial* window: the window shrinks near
//!   the start, so the series has no leading gaps and `sma[0] == close[0]`.
//! - [`full_window_sma`] is null-padded: `None` until `period` values exist.

use serde::{Deserialize, Serialize};

use crate::strategies::helpers::percent_of;
use crate::Candle;

/// Default band for [`is_low_volatility`], in percent
pub const DEFAULT_MAX_DIFF_PERCENT: f64 = 0.5;

/// One point of a moving-average series, aligned by index with its candles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaPoint {
    pub begin: String,
    pub value: f64,
}

/// Simple moving average of closes with a partial leading window.
///
/// Value at `i` is the mean of `candles[max(0, i - period + 1)..=i]`.
/// A `period` of zero is treated as one.
pub fn simple_moving_average(candles: &[Candle], period: usize) -> Vec<MaPoint> {
    let period = period.max(1);
    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let start = (i + 1).saturating_sub(period);
            let window = &candles[start..=i];
            let sum: f64 = window.iter().map(|c| c.close).sum();
            MaPoint {
                begin: candle.begin.clone(),
                value: sum / window.len() as f64,
            }
        })
        .collect()
}

/// Simple moving average that is undefined until a full window exists.
pub fn full_window_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let period = period.max(1);
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let sum: f64 = values[i + 1 - period..=i].iter().sum();
            Some(sum / period as f64)
        })
        .collect()
}

/// True when two series stay within `max_diff_percent` of each other.
///
/// Every index except the last is checked; the last point is left to
/// [`acceleration_direction`]. Both series need at least two points. A zero
/// midpoint counts as a violation.
pub fn is_low_volatility(a: &[MaPoint], b: &[MaPoint], max_diff_percent: f64) -> bool {
    if a.len() < 2 || b.len() < 2 {
        return false;
    }

    a[..a.len() - 1].iter().enumerate().all(|(i, pa)| {
        let Some(pb) = b.get(i) else {
            return false;
        };
        let diff = (pa.value - pb.value).abs();
        let avg = (pa.value + pb.value) / 2.0;
        percent_of(diff, avg).is_some_and(|pct| pct <= max_diff_percent)
    })
}

/// Sign of the difference between the latest steps of two series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Acceleration {
    Down,
    Flat,
    Up,
}

impl Acceleration {
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Acceleration::Down => -1,
            Acceleration::Flat => 0,
            Acceleration::Up => 1,
        }
    }
}

/// Compare the most recent one-step change of `a` against that of `b`.
///
/// `Up` when `a` moved up more than `b`, `Down` when it moved down more,
/// `Flat` on a tie or when either series is shorter than two points.
pub fn acceleration_direction(a: &[MaPoint], b: &[MaPoint]) -> Acceleration {
    let (Some(step_a), Some(step_b)) = (last_step(a), last_step(b)) else {
        return Acceleration::Flat;
    };

    if step_a > step_b {
        Acceleration::Up
    } else if step_a < step_b {
        Acceleration::Down
    } else {
        Acceleration::Flat
    }
}

fn last_step(series: &[MaPoint]) -> Option<f64> {
    match series {
        [.., prev, last] => Some(last.value - prev.value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closes(values: &[f64]) -> Vec<Candle> {
        values
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(format!("d{i}"), c, c, c, c).with_position(i))
            .collect()
    }

    fn series(values: &[f64]) -> Vec<MaPoint> {
        values
            .iter()
            .map(|&value| MaPoint {
                begin: String::new(),
                value,
            })
            .collect()
    }

    #[test]
    fn sma_partial_window() {
        let candles = closes(&[2.0, 4.0, 6.0, 8.0]);
        let sma = simple_moving_average(&candles, 3);
        let values: Vec<f64> = sma.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0, 6.0]);
        assert_eq!(sma[3].begin, "d3");
    }

    #[test]
    fn sma_shorter_than_period_is_not_an_error() {
        let candles = closes(&[10.0, 20.0]);
        let sma = simple_moving_average(&candles, 50);
        assert_eq!(sma.len(), 2);
        assert_eq!(sma[1].value, 15.0);
    }

    #[test]
    fn sma_zero_period_is_identity() {
        let candles = closes(&[1.0, 5.0, 9.0]);
        let values: Vec<f64> = simple_moving_average(&candles, 0).iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 5.0, 9.0]);
    }

    #[test]
    fn sma_empty_input() {
        assert!(simple_moving_average(&[], 5).is_empty());
    }

    #[test]
    fn full_window_is_null_padded() {
        let sma = full_window_sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(sma, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn low_volatility_ignores_last_point() {
        let a = series(&[100.0, 100.2, 150.0]);
        let b = series(&[100.0, 100.0, 100.0]);
        assert!(is_low_volatility(&a, &b, DEFAULT_MAX_DIFF_PERCENT));
    }

    #[test]
    fn low_volatility_rejects_wide_spread() {
        let a = series(&[100.0, 101.0, 100.0]);
        let b = series(&[100.0, 100.0, 100.0]);
        assert!(!is_low_volatility(&a, &b, 0.5));
        assert!(is_low_volatility(&a, &b, 1.0));
    }

    #[test]
    fn low_volatility_needs_two_points() {
        let a = series(&[100.0]);
        assert!(!is_low_volatility(&a, &a, 0.5));
    }

    #[test]
    fn low_volatility_zero_midpoint_is_a_violation() {
        let a = series(&[0.0, 0.0, 0.0]);
        assert!(!is_low_volatility(&a, &a, 0.5));
    }

    #[test]
    fn acceleration_directions() {
        let base = series(&[10.0, 11.0]);
        assert_eq!(acceleration_direction(&series(&[10.0, 12.0]), &base), Acceleration::Up);
        assert_eq!(acceleration_direction(&series(&[10.0, 10.5]), &base), Acceleration::Down);
        assert_eq!(acceleration_direction(&series(&[5.0, 6.0]), &base), Acceleration::Flat);
        assert_eq!(acceleration_direction(&series(&[5.0]), &base), Acceleration::Flat);
        assert_eq!(Acceleration::Up.sign(), 1);
        assert_eq!(Acceleration::Down.sign(), -1);
    }
}
