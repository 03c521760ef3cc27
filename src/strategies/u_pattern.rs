//! U-Pattern - peak, strictly falling run into a trough, strictly rising run
//! back up to the peak.
//!
//! The search is an explicit three-stage state machine:
//!
//! ```text
//! SeekPeak(at) --peak--> SeekTrough(a, b) --trough--> SeekRecovery(a, b, c)
//!      ^                      |    ^                        |        |
//!      |   run broken / B out of range                      |        |
//!      +----------------------+    +-- run broken / C out --+        |
//!      +------------------------- match, resume at C -----------------+
//! ```
//!
//! Every transition strictly advances one of `at`, `b` or `c`, so the walk
//! is bounded by `O(lookback * max_gap^2)`.

use std::collections::HashMap;

use tracing::debug;

use super::helpers::{closes_strictly_falling, closes_strictly_rising, trailing};
use crate::{
    params::{
        ensure_known, get_period, get_value, validate_all, ParamMeta, ParameterizedStrategy,
    },
    AnalysisResult, Candle, Result, ScanError, Setup, Strategy, StrategyMetadata,
};

static U_PATTERN_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("lookback", 100.0, (3.0, 5000.0), "Candles considered"),
    ParamMeta::period("min_candles", 20.0, (3.0, 5000.0), "Below this no search is made"),
    ParamMeta::period("min_gap", 3.0, (1.0, 100.0), "Fewest bars between A-B and B-C"),
    ParamMeta::period("max_gap", 15.0, (1.0, 100.0), "Most bars between A-B and B-C"),
    ParamMeta::ratio(
        "recovery_ratio",
        0.99,
        (0.5, 1.5),
        "close[C] must reach high[A] times this",
    ),
];

#[derive(Debug, Clone)]
pub struct UPattern {
    pub lookback: usize,
    pub min_candles: usize,
    pub min_gap: usize,
    pub max_gap: usize,
    pub recovery_ratio: f64,
}

impl Default for UPattern {
    fn default() -> Self {
        Self {
            lookback: 100,
            min_candles: 20,
            min_gap: 3,
            max_gap: 15,
            recovery_ratio: 0.99,
        }
    }
}

/// One matched pattern, indices relative to the searched window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UMatch {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    SeekPeak { at: usize },
    SeekTrough { a: usize, b: usize },
    SeekRecovery { a: usize, b: usize, c: usize },
    Done,
}

#[inline]
fn is_peak(bars: &[Candle], i: usize) -> bool {
    bars[i].high > bars[i - 1].high && bars[i].high > bars[i + 1].high
}

#[inline]
fn is_trough(bars: &[Candle], i: usize) -> bool {
    bars[i].low < bars[i - 1].low && bars[i].low < bars[i + 1].low
}

impl UPattern {
    /// All non-overlapping matches in `bars`, oldest first.
    ///
    /// After a match the peak search restarts at `c` itself, so the recovery
    /// bar of one U may be the peak `a` of the next. Bars strictly inside
    /// `a..c` are never scanned again.
    pub fn find_matches(&self, bars: &[Candle]) -> Vec<UMatch> {
        let len = bars.len();
        let mut matches = Vec::new();
        if len < 3 {
            return matches;
        }

        let mut stage = Stage::SeekPeak { at: 1 };
        loop {
            stage = match stage {
                Stage::SeekPeak { at } if at + 1 >= len => Stage::Done,
                Stage::SeekPeak { at } if at >= 1 && is_peak(bars, at) => Stage::SeekTrough {
                    a: at,
                    b: at + self.min_gap,
                },
                Stage::SeekPeak { at } => Stage::SeekPeak { at: at + 1 },

                Stage::SeekTrough { a, b } => {
                    let last_b = (a + self.max_gap).min(len - 2);
                    if b > last_b || !closes_strictly_falling(bars, a, b) {
                        Stage::SeekPeak { at: a + 1 }
                    } else if is_trough(bars, b) {
                        Stage::SeekRecovery {
                            a,
                            b,
                            c: b + self.min_gap,
                        }
                    } else {
                        Stage::SeekTrough { a, b: b + 1 }
                    }
                }

                Stage::SeekRecovery { a, b, c } => {
                    let last_c = (b + self.max_gap).min(len - 1);
                    if c > last_c || !closes_strictly_rising(bars, b, c) {
                        Stage::SeekTrough { a, b: b + 1 }
                    } else if bars[c].close >= bars[a].high * self.recovery_ratio {
                        matches.push(UMatch { a, b, c });
                        Stage::SeekPeak { at: c }
                    } else {
                        Stage::SeekRecovery { a, b, c: c + 1 }
                    }
                }

                Stage::Done => break,
            };
        }

        matches
    }
}

impl ParameterizedStrategy for UPattern {
    const KEY: &'static str = "u_pattern";

    fn param_meta() -> &'static [ParamMeta] {
        U_PATTERN_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        ensure_known(params, U_PATTERN_PARAMS)?;
        let strategy = Self {
            lookback: get_period(params, U_PATTERN_PARAMS, "lookback")?,
            min_candles: get_period(params, U_PATTERN_PARAMS, "min_candles")?,
            min_gap: get_period(params, U_PATTERN_PARAMS, "min_gap")?,
            max_gap: get_period(params, U_PATTERN_PARAMS, "max_gap")?,
            recovery_ratio: get_value(params, U_PATTERN_PARAMS, "recovery_ratio")?,
        };
        strategy.validate_config()?;
        Ok(strategy)
    }
}

impl Strategy for UPattern {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn min_candles(&self) -> usize {
        self.min_candles
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        if candles.len() < self.min_candles {
            return Vec::new();
        }
        let bars = trailing(candles, self.lookback);

        self.find_matches(bars)
            .into_iter()
            .map(|UMatch { a, b, c }| {
                let entry = bars[c].close;
                let stop_loss = bars[b].low;
                let take_profit = bars[a].high;
                debug!(ticker, a, b, c, entry, stop_loss, take_profit, "U-pattern");
                AnalysisResult::new(
                    ticker,
                    bars,
                    Setup::UPattern {
                        a,
                        b,
                        c,
                        entry,
                        stop_loss,
                        take_profit,
                    },
                )
            })
            .collect()
    }

    fn validate_config(&self) -> Result<()> {
        validate_all(
            U_PATTERN_PARAMS,
            &[
                ("lookback", self.lookback as f64),
                ("min_candles", self.min_candles as f64),
                ("min_gap", self.min_gap as f64),
                ("max_gap", self.max_gap as f64),
                ("recovery_ratio", self.recovery_ratio),
            ],
        )?;
        if self.min_gap > self.max_gap {
            return Err(ScanError::InvalidConfig("min_gap must not exceed max_gap".into()));
        }
        Ok(())
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: Self::KEY.to_string(),
            label: "U-pattern".to_string(),
            description: format!(
                "Peak A, strictly falling closes into trough B {}-{} bars later, strictly rising \
                 closes into C {}-{} bars after B with close[C] >= {} x high[A].",
                self.min_gap, self.max_gap, self.min_gap, self.max_gap, self.recovery_ratio
            ),
        }
    }
}
