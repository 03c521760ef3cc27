//! SMA 360x50 crossover scanner
//!
//! Works on the trailing `window` bars only. Both [`CrossoverScanner::search`]
//! and [`CrossoverScanner::find_crosses`] derive their averages from that
//! slice on every call, so for one candle sequence they always agree.
//!
//! ```rust
//! use setupscan::prelude::*;
//!
//! let scanner = CrossoverScanner::default();
//! let candles: Vec<Candle> = (0..10)
//!     .map(|i| Candle::new(format!("d{i}"), 1.0, 1.0, 1.0, 1.0))
//!     .collect();
//!
//! // not enough history
//! assert!(scanner.search(&candles, "SBER").is_none());
//! assert!(scanner.find_crosses(&candles).is_empty());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::helpers::trailing;
use crate::{
    indicators::{simple_moving_average, MaPoint},
    params::{
        ensure_known, get_period, get_value, validate_all, ParamMeta, ParameterizedStrategy,
    },
    AnalysisResult, Candle, CrossKind, Result, ScanError, Setup, Strategy, StrategyMetadata,
};

static CROSSOVER_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("window", 360.0, (2.0, 5000.0), "Trailing bars analysed, also the minimum"),
    ParamMeta::period("fast_period", 50.0, (1.0, 5000.0), "Fast SMA period"),
    ParamMeta::period("slow_period", 360.0, (1.0, 5000.0), "Slow SMA period"),
    ParamMeta::period("search_window", 15.0, (2.0, 5000.0), "Bars searched by `search`"),
    ParamMeta::period("list_window", 90.0, (2.0, 5000.0), "Bars listed by `find_crosses`"),
    ParamMeta::price(
        "tolerance",
        0.0001,
        (0.0, 1.0),
        "Adjacent spread product must be below minus this",
    ),
];

/// Best (first) cross found by [`CrossoverScanner::search`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSetup {
    pub ticker: String,
    pub kind: CrossKind,
    /// Fast SMA at the bar after the cross
    pub price: f64,
    /// Index into the uncropped input
    pub cross_index: usize,
    pub begin: String,
}

/// One entry of [`CrossoverScanner::find_crosses`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossover {
    /// Index into the uncropped input
    pub index: usize,
    pub begin: String,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct CrossoverScanner {
    pub window: usize,
    pub fast_period: usize,
    pub slow_period: usize,
    pub search_window: usize,
    pub list_window: usize,
    pub tolerance: f64,
}

impl Default for CrossoverScanner {
    fn default() -> Self {
        Self {
            window: 360,
            fast_period: 50,
            slow_period: 360,
            search_window: 15,
            list_window: 90,
            tolerance: 0.0001,
        }
    }
}

/// Fast/slow spread series of one analysis slice
struct Spread {
    offset: usize,
    fast: Vec<MaPoint>,
    diff: Vec<f64>,
}

impl CrossoverScanner {
    fn spread(&self, candles: &[Candle]) -> Option<Spread> {
        if candles.len() < self.window {
            return None;
        }
        let slice = trailing(candles, self.window);
        let fast = simple_moving_average(slice, self.fast_period);
        let slow = simple_moving_average(slice, self.slow_period);
        let diff = fast.iter().zip(&slow).map(|(f, s)| f.value - s.value).collect();
        Some(Spread {
            offset: candles.len() - slice.len(),
            fast,
            diff,
        })
    }

    #[inline]
    fn is_cross(&self, prev: f64, next: f64) -> bool {
        prev * next < -self.tolerance
    }

    /// First cross in the trailing search window, or `None` when there is
    /// none or fewer than `window` candles are given.
    pub fn search(&self, candles: &[Candle], ticker: &str) -> Option<CrossSetup> {
        let spread = self.spread(candles)?;
        let len = spread.diff.len();
        let start = len.saturating_sub(self.search_window);

        (start..len.saturating_sub(1)).find_map(|i| {
            let (prev, next) = (spread.diff[i], spread.diff[i + 1]);
            if !self.is_cross(prev, next) {
                return None;
            }
            let kind = if prev < 0.0 {
                CrossKind::Gold
            } else {
                CrossKind::Death
            };
            let cross_index = i + 1 + spread.offset;
            Some(CrossSetup {
                ticker: ticker.to_string(),
                kind,
                price: spread.fast[i + 1].value,
                cross_index,
                begin: candles[cross_index].begin.clone(),
            })
        })
    }

    /// Every cross in the trailing list window, oldest to newest
    pub fn find_crosses(&self, candles: &[Candle]) -> Vec<Crossover> {
        let Some(spread) = self.spread(candles) else {
            return Vec::new();
        };
        let len = spread.diff.len();
        let start = len.saturating_sub(self.list_window).max(1);

        (start..len)
            .filter(|&i| self.is_cross(spread.diff[i - 1], spread.diff[i]))
            .map(|i| {
                let index = i + spread.offset;
                Crossover {
                    index,
                    begin: candles[index].begin.clone(),
                    price: spread.fast[i].value,
                }
            })
            .collect()
    }
}

impl ParameterizedStrategy for CrossoverScanner {
    const KEY: &'static str = "sma_cross_360x50";

    fn param_meta() -> &'static [ParamMeta] {
        CROSSOVER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        ensure_known(params, CROSSOVER_PARAMS)?;
        let scanner = Self {
            window: get_period(params, CROSSOVER_PARAMS, "window")?,
            fast_period: get_period(params, CROSSOVER_PARAMS, "fast_period")?,
            slow_period: get_period(params, CROSSOVER_PARAMS, "slow_period")?,
            search_window: get_period(params, CROSSOVER_PARAMS, "search_window")?,
            list_window: get_period(params, CROSSOVER_PARAMS, "list_window")?,
            tolerance: get_value(params, CROSSOVER_PARAMS, "tolerance")?,
        };
        scanner.validate_config()?;
        Ok(scanner)
    }
}

impl Strategy for CrossoverScanner {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn min_candles(&self) -> usize {
        self.window
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        let Some(hit) = self.search(candles, ticker) else {
            return Vec::new();
        };

        debug!(
            ticker,
            kind = ?hit.kind,
            price = hit.price,
            cross_index = hit.cross_index,
            "SMA crossover"
        );
        vec![AnalysisResult::new(
            ticker,
            trailing(candles, self.window),
            Setup::SmaCross360x50 {
                kind: hit.kind,
                price: hit.price,
                cross_index: hit.cross_index,
            },
        )]
    }

    fn validate_config(&self) -> Result<()> {
        validate_all(
            CROSSOVER_PARAMS,
            &[
                ("window", self.window as f64),
                ("fast_period", self.fast_period as f64),
                ("slow_period", self.slow_period as f64),
                ("search_window", self.search_window as f64),
                ("list_window", self.list_window as f64),
                ("tolerance", self.tolerance),
            ],
        )?;
        if self.fast_period >= self.slow_period {
            return Err(ScanError::InvalidConfig(
                "fast_period must be shorter than slow_period".into(),
            ));
        }
        Ok(())
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: Self::KEY.to_string(),
            label: format!("Golden cross (SMA{}/{})", self.slow_period, self.fast_period),
            description: format!(
                "Sign change of SMA{} - SMA{} over the last {} of {} bars.",
                self.fast_period, self.slow_period, self.search_window, self.window
            ),
        }
    }
}
