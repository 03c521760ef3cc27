//! # setupscan - trade setup scanner
//!
//! Pattern-detection strategies ("setups") over OHLC candle series, a
//! moving-average toolkit they share, and a registry that dispatches them by
//! name over one ticker or a whole ticker universe.
//!
//! ## Quick Start
//!
//! ```rust
//! use setupscan::prelude::*;
//!
//! let registry = RegistryBuilder::new()
//!     .with_all_defaults()
//!     .build()
//!     .unwrap();
//!
//! let candles: Vec<Candle> = (0..40)
//!     .map(|i| {
//!         let base = 100.0 + i as f64;
//!         Candle::new(format!("2024-01-{:02}", i % 28 + 1), base, base + 1.0, base - 1.0, base + 0.5)
//!             .with_position(i)
//!     })
//!     .collect();
//!
//! let signals = registry.analyze("turtle_breakout", &candles, "SBER").unwrap();
//! assert_eq!(signals.len(), 1);
//! ```

pub mod config;
pub mod feed;
pub mod indicators;
pub mod params;
pub mod registry;
pub mod strategies;

pub mod prelude {
    pub use crate::{
        // Configuration
        config::{ScannerConfig, StrategyConfig},
        // Feeds
        feed::{load_finam_csv, parse_finam_csv},
        // Indicators
        indicators::{
            acceleration_direction, full_window_sma, is_low_volatility, simple_moving_average,
            Acceleration, MaPoint,
        },
        // Parameters
        params::{ParamMeta, ParamType, ParameterizedStrategy},
        // Registry
        registry::{BatchReport, RegistryBuilder, StrategyRegistry, TickerFailure},
        // Strategies
        strategies::*,
        // Types
        AnalysisResult,
        Bias,
        BuiltinStrategy,
        Candle,
        CrossKind,
        Result,
        ScanError,
        Setup,
        Side,
        SignalKind,
        Strategy,
        StrategyMetadata,
    };
}

use serde::{Deserialize, Serialize};

use crate::indicators::Acceleration;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors surfaced by the scanner
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Feed error at line {line}: {reason}")]
    Feed { line: u64, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================
// CANDLE
// ============================================================

/// One OHLC bar.
///
/// `high >= max(open, close)` and `low <= min(open, close)` are assumed but
/// never checked; only non-finite prices are rejected by [`Candle::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Timestamp label of the bar, e.g. `2024-01-31` or `2024-01-31T10:00:00`
    pub begin: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Position of the bar within its source sequence
    #[serde(default)]
    pub position: usize,
}

impl Candle {
    pub fn new(begin: impl Into<String>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            begin: begin.into(),
            open,
            high,
            low,
            close,
            volume: None,
            position: 0,
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Upper edge of the real body
    #[inline]
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Lower edge of the real body
    #[inline]
    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    #[inline]
    pub fn is_green(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        self.close < self.open
    }

    /// Reject NaN and infinite prices
    pub fn validate(&self) -> Result<()> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(ScanError::InvalidCandle {
                index: self.position,
                reason: "NaN in OHLC",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(ScanError::InvalidCandle {
                index: self.position,
                reason: "Infinite value in OHLC",
            });
        }
        Ok(())
    }
}

/// Validate a whole sequence, reporting the slice index of the first bad candle.
pub fn validate_candles(candles: &[Candle]) -> Result<()> {
    for (i, candle) in candles.iter().enumerate() {
        candle.validate().map_err(|e| match e {
            ScanError::InvalidCandle { reason, .. } => ScanError::InvalidCandle { index: i, reason },
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// SIGNAL TAGS
// ============================================================

/// Trade direction of a breakout-style setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

/// Bias of a reversal setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
}

/// Moving-average cross direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossKind {
    /// Fast average crossed above the slow one
    Gold,
    /// Fast average crossed below the slow one
    Death,
}

/// Flat tag over every strategy's own vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Long,
    Short,
    Bullish,
    Bearish,
    Gold,
    Death,
    Breakout,
}

impl SignalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Long => "long",
            SignalKind::Short => "short",
            SignalKind::Bullish => "bullish",
            SignalKind::Bearish => "bearish",
            SignalKind::Gold => "gold",
            SignalKind::Death => "death",
            SignalKind::Breakout => "breakout",
        }
    }
}

impl From<Side> for SignalKind {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => SignalKind::Long,
            Side::Short => SignalKind::Short,
        }
    }
}

impl From<Bias> for SignalKind {
    fn from(bias: Bias) -> Self {
        match bias {
            Bias::Bullish => SignalKind::Bullish,
            Bias::Bearish => SignalKind::Bearish,
        }
    }
}

impl From<CrossKind> for SignalKind {
    fn from(kind: CrossKind) -> Self {
        match kind {
            CrossKind::Gold => SignalKind::Gold,
            CrossKind::Death => SignalKind::Death,
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// ANALYSIS RESULT
// ============================================================

/// Strategy-specific payload of a signal.
///
/// Indices (`a`, `b`, `c`, `t`) are relative to the evidence window carried by
/// the enclosing [`AnalysisResult`]; `cross_index` is absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "setup", rename_all = "snake_case")]
pub enum Setup {
    Turtle {
        side: Side,
        entry: f64,
        stop: f64,
    },
    LowVolatility {
        side: Side,
        entry: f64,
        stop: f64,
        count: usize,
    },
    Glide {
        side: Side,
        /// Fast SMA at the last bar (SMA18 by default)
        #[serde(rename = "sma18")]
        sma_fast: f64,
        /// Slow SMA at the last bar (SMA50 by default)
        #[serde(rename = "sma50")]
        sma_slow: f64,
        acceleration: Acceleration,
    },
    UPattern {
        a: usize,
        b: usize,
        c: usize,
        entry: f64,
        stop_loss: f64,
        take_profit: f64,
    },
    Oops {
        bias: Bias,
        entry: f64,
        stop_loss: f64,
        take_profit: f64,
    },
    #[serde(rename = "sma_cross_365x50")]
    SmaCross365x50 {
        kind: CrossKind,
        t: usize,
        sma50: f64,
        sma365: f64,
    },
    Breakout {
        close: f64,
        high: f64,
        max30: f64,
        over: f64,
    },
    #[serde(rename = "sma_cross_360x50")]
    SmaCross360x50 {
        kind: CrossKind,
        price: f64,
        cross_index: usize,
    },
}

/// One signal emitted by a strategy for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    /// Evidence window the signal was computed from
    pub candles: Vec<Candle>,
    pub setup: Setup,
}

impl AnalysisResult {
    pub fn new(ticker: &str, candles: &[Candle], setup: Setup) -> Self {
        Self {
            ticker: ticker.to_string(),
            candles: candles.to_vec(),
            setup,
        }
    }

    pub fn kind(&self) -> SignalKind {
        match &self.setup {
            Setup::Turtle { side, .. }
            | Setup::LowVolatility { side, .. }
            | Setup::Glide { side, .. } => (*side).into(),
            Setup::UPattern { .. } => SignalKind::Long,
            Setup::Oops { bias, .. } => (*bias).into(),
            Setup::SmaCross365x50 { kind, .. } | Setup::SmaCross360x50 { kind, .. } => {
                (*kind).into()
            }
            Setup::Breakout { .. } => SignalKind::Breakout,
        }
    }

    /// Entry price, for setups that define one
    pub fn entry(&self) -> Option<f64> {
        match &self.setup {
            Setup::Turtle { entry, .. }
            | Setup::LowVolatility { entry, .. }
            | Setup::UPattern { entry, .. }
            | Setup::Oops { entry, .. } => Some(*entry),
            Setup::Breakout { close, .. } => Some(*close),
            Setup::Glide { .. } | Setup::SmaCross365x50 { .. } | Setup::SmaCross360x50 { .. } => {
                None
            }
        }
    }
}

// ============================================================
// STRATEGY TRAIT
// ============================================================

/// Presentation metadata of a strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyMetadata {
    pub name: String,
    pub label: String,
    pub description: String,
}

/// A named, stateless pattern detector.
///
/// Implementations are pure: the same candles always give the same results,
/// and the input slice is never modified.
pub trait Strategy: Send + Sync {
    /// Unique registry key
    fn name(&self) -> &str;

    /// Number of most recent candles the strategy looks at
    fn lookback(&self) -> usize;

    /// Minimum number of candles below which no signal is ever produced
    fn min_candles(&self) -> usize {
        1
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: self.name().to_string(),
            label: self.name().to_string(),
            description: String::new(),
        }
    }
}

// ============================================================
// BUILTIN STRATEGIES - generated via macro
// ============================================================

use std::collections::HashMap;

use params::ParameterizedStrategy;
use strategies::*;

/// Macro to generate BuiltinStrategy enum without boilerplate
macro_rules! define_builtin_strategies {
    (
        $(
            $variant:ident($strategy:ty)
        ),* $(,)?
    ) => {
        /// All builtin strategies - closed set, constructible by key
        #[derive(Debug, Clone)]
        pub enum BuiltinStrategy {
            $($variant($strategy)),*
        }

        impl BuiltinStrategy {
            /// Keys of every builtin strategy, in declaration order
            pub const KEYS: &'static [&'static str] = &[
                $(<$strategy as ParameterizedStrategy>::KEY),*
            ];

            /// Build a strategy from its key and parameter overrides
            pub fn from_params(key: &str, params: &HashMap<&str, f64>) -> Result<Self> {
                match key {
                    $(
                        k if k == <$strategy as ParameterizedStrategy>::KEY => {
                            Ok(Self::$variant(<$strategy as ParameterizedStrategy>::with_params(params)?))
                        }
                    )*
                    other => Err(ScanError::InvalidConfig(format!("unknown strategy type '{other}'"))),
                }
            }
        }

        impl Strategy for BuiltinStrategy {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant(s) => Strategy::name(s)),*
                }
            }

            fn lookback(&self) -> usize {
                match self {
                    $(Self::$variant(s) => Strategy::lookback(s)),*
                }
            }

            fn min_candles(&self) -> usize {
                match self {
                    $(Self::$variant(s) => Strategy::min_candles(s)),*
                }
            }

            #[inline]
            fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
                match self {
                    $(Self::$variant(s) => Strategy::analyze(s, candles, ticker)),*
                }
            }

            fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(s) => Strategy::validate_config(s)),*
                }
            }

            fn metadata(&self) -> StrategyMetadata {
                match self {
                    $(Self::$variant(s) => Strategy::metadata(s)),*
                }
            }
        }
    };
}

define_builtin_strategies! {
    Turtle(TurtleBreakout),
    LowVolatility(LowVolatilityGap),
    Glide(GlideV2),
    UPattern(UPattern),
    Oops(OopsReversal),
    SmaCross365x50(SmaCross365x50),
    Breakout(Breakout),
    SmaCross360x50(CrossoverScanner),
}

impl BuiltinStrategy {
    /// The seven setups registered by default, in listing order
    pub fn defaults() -> Vec<BuiltinStrategy> {
        vec![
            BuiltinStrategy::Turtle(TurtleBreakout::default()),
            BuiltinStrategy::LowVolatility(LowVolatilityGap::default()),
            BuiltinStrategy::Glide(GlideV2::default()),
            BuiltinStrategy::UPattern(UPattern::default()),
            BuiltinStrategy::Oops(OopsReversal::default()),
            BuiltinStrategy::SmaCross365x50(SmaCross365x50::default()),
            BuiltinStrategy::Breakout(Breakout::default()),
        ]
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(o: f64, h: f64, l: f64, c: f64) -> Candle {
        Candle::new("2024-01-01", o, h, l, c)
    }

    #[test]
    fn test_candle_helpers() {
        let candle = bar(100.0, 110.0, 90.0, 105.0);
        assert_eq!(candle.body(), 5.0);
        assert_eq!(candle.body_top(), 105.0);
        assert_eq!(candle.body_bottom(), 100.0);
        assert!(candle.is_green());
        assert!(!candle.is_red());
    }

    #[test]
    fn test_doji_is_neither_green_nor_red() {
        let candle = bar(100.0, 101.0, 99.0, 100.0);
        assert!(!candle.is_green());
        assert!(!candle.is_red());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(bar(1.0, 2.0, 0.5, 1.5).validate().is_ok());
        assert!(bar(f64::NAN, 2.0, 0.5, 1.5).validate().is_err());
        assert!(bar(1.0, f64::INFINITY, 0.5, 1.5).validate().is_err());
    }

    #[test]
    fn test_validate_does_not_check_ranges() {
        // high below low is garbage-in, not an error
        assert!(bar(1.0, 0.5, 2.0, 1.5).validate().is_ok());
    }

    #[test]
    fn test_validate_candles_reports_slice_index() {
        let candles = vec![bar(1.0, 2.0, 0.5, 1.5), bar(1.0, 2.0, 0.5, f64::NAN)];
        match validate_candles(&candles) {
            Err(ScanError::InvalidCandle { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidCandle, got {other:?}"),
        }
    }

    #[test]
    fn test_signal_kind_mapping() {
        let result = AnalysisResult::new(
            "SBER",
            &[],
            Setup::Oops {
                bias: Bias::Bearish,
                entry: 10.0,
                stop_loss: 11.0,
                take_profit: 12.0,
            },
        );
        assert_eq!(result.kind(), SignalKind::Bearish);
        assert_eq!(result.kind().to_string(), "bearish");
        assert_eq!(result.entry(), Some(10.0));
    }

    #[test]
    fn test_result_serializes_with_setup_tag() {
        let result = AnalysisResult::new(
            "GAZP",
            &[bar(1.0, 2.0, 0.5, 1.5)],
            Setup::Turtle {
                side: Side::Long,
                entry: 1.5,
                stop: 1.0,
            },
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["setup"]["setup"], "turtle");
        assert_eq!(json["setup"]["side"], "long");
        assert_eq!(json["candles"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_builtin_keys_are_unique() {
        let mut keys = BuiltinStrategy::KEYS.to_vec();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), BuiltinStrategy::KEYS.len());
    }

    #[test]
    fn test_builtin_from_params_unknown_key() {
        let params = HashMap::new();
        assert!(matches!(
            BuiltinStrategy::from_params("nope", &params),
            Err(ScanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builtin_from_params_defaults() {
        let params = HashMap::new();
        for key in BuiltinStrategy::KEYS {
            let strategy = BuiltinStrategy::from_params(key, &params).unwrap();
            assert_eq!(strategy.name(), *key);
            assert!(strategy.validate_config().is_ok());
        }
    }

    #[test]
    fn test_defaults_are_the_seven_setups() {
        let defaults = BuiltinStrategy::defaults();
        assert_eq!(defaults.len(), 7);
        assert!(defaults.iter().all(|s| s.name() != CrossoverScanner::KEY));
    }
}
