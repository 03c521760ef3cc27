//! Turtle Breakout - close beyond the prior channel of the signal window

use std::collections::HashMap;

use tracing::debug;

use super::helpers::{max_close, max_high, min_close, min_low, trailing};
use crate::{
    params::{ensure_known, get_period, validate_all, ParamMeta, ParameterizedStrategy},
    AnalysisResult, Candle, Result, ScanError, Setup, Side, Strategy, StrategyMetadata,
};

static TURTLE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("lookback", 30.0, (2.0, 1000.0), "Candles considered"),
    ParamMeta::period(
        "signal_window",
        20.0,
        (2.0, 1000.0),
        "Window whose last close is compared with the prior channel",
    ),
    ParamMeta::period("stop_window", 10.0, (1.0, 1000.0), "Window for the stop close"),
];

/// Donchian-style breakout of the last close over the previous
/// `signal_window - 1` highs (long) or lows (short).
#[derive(Debug, Clone)]
pub struct TurtleBreakout {
    pub lookback: usize,
    pub signal_window: usize,
    pub stop_window: usize,
}

impl Default for TurtleBreakout {
    fn default() -> Self {
        Self {
            lookback: 30,
            signal_window: 20,
            stop_window: 10,
        }
    }
}

impl ParameterizedStrategy for TurtleBreakout {
    const KEY: &'static str = "turtle_breakout";

    fn param_meta() -> &'static [ParamMeta] {
        TURTLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        ensure_known(params, TURTLE_PARAMS)?;
        let strategy = Self {
            lookback: get_period(params, TURTLE_PARAMS, "lookback")?,
            signal_window: get_period(params, TURTLE_PARAMS, "signal_window")?,
            stop_window: get_period(params, TURTLE_PARAMS, "stop_window")?,
        };
        strategy.validate_config()?;
        Ok(strategy)
    }
}

impl Strategy for TurtleBreakout {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn min_candles(&self) -> usize {
        2
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        let bars = trailing(candles, self.lookback);
        let window = trailing(bars, self.signal_window);
        if window.len() < self.min_candles() {
            return Vec::new();
        }
        let Some((last, previous)) = window.split_last() else {
            return Vec::new();
        };
        let stops = trailing(bars, self.stop_window);

        let (side, stop) = if last.close > max_high(previous) {
            (Side::Long, min_close(stops))
        } else if last.close < min_low(previous) {
            (Side::Short, max_close(stops))
        } else {
            return Vec::new();
        };

        debug!(ticker, ?side, entry = last.close, stop, "Turtle breakout");
        vec![AnalysisResult::new(
            ticker,
            window,
            Setup::Turtle {
                side,
                entry: last.close,
                stop,
            },
        )]
    }

    fn validate_config(&self) -> Result<()> {
        validate_all(
            TURTLE_PARAMS,
            &[
                ("lookback", self.lookback as f64),
                ("signal_window", self.signal_window as f64),
                ("stop_window", self.stop_window as f64),
            ],
        )?;
        if self.signal_window > self.lookback || self.stop_window > self.lookback {
            return Err(ScanError::InvalidConfig(
                "signal_window and stop_window must fit in lookback".into(),
            ));
        }
        Ok(())
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: Self::KEY.to_string(),
            label: "Turtle breakout".to_string(),
            description: format!(
                "Last close of the {}-bar window above the previous highs is LONG, below the \
                 previous lows is SHORT; stop at the extreme close of the last {} bars.",
                self.signal_window, self.stop_window
            ),
        }
    }
}
