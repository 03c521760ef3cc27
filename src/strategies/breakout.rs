//! Breakout - last bar at or near the 30-bar high.
//!
//! Fires when the close or the high comes within `proximity_ratio` of the
//! window high and the close is no more than `max_over_percent` above it.
//! A close *below* the high also fires, as long as one of the proximity
//! conditions holds: the signal means "pressing on the high", not "closed
//! through it".

use std::collections::HashMap;

use tracing::debug;

use super::helpers::{max_high, percent_change, trailing};
use crate::{
    params::{
        ensure_known, get_period, get_value, validate_all, ParamMeta, ParameterizedStrategy,
    },
    AnalysisResult, Candle, Result, Setup, Strategy, StrategyMetadata,
};

static BREAKOUT_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("lookback", 30.0, (1.0, 1000.0), "Candles considered"),
    ParamMeta::ratio(
        "proximity_ratio",
        0.99,
        (0.5, 1.0),
        "Close or high must reach the window high times this",
    ),
    ParamMeta::percent(
        "max_over_percent",
        1.0,
        (0.0, 100.0),
        "Largest close above the window high, in percent",
    ),
];

#[derive(Debug, Clone)]
pub struct Breakout {
    pub lookback: usize,
    pub proximity_ratio: f64,
    pub max_over_percent: f64,
}

impl Default for Breakout {
    fn default() -> Self {
        Self {
            lookback: 30,
            proximity_ratio: 0.99,
            max_over_percent: 1.0,
        }
    }
}

impl ParameterizedStrategy for Breakout {
    const KEY: &'static str = "breakout";

    fn param_meta() -> &'static [ParamMeta] {
        BREAKOUT_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        ensure_known(params, BREAKOUT_PARAMS)?;
        let strategy = Self {
            lookback: get_period(params, BREAKOUT_PARAMS, "lookback")?,
            proximity_ratio: get_value(params, BREAKOUT_PARAMS, "proximity_ratio")?,
            max_over_percent: get_value(params, BREAKOUT_PARAMS, "max_over_percent")?,
        };
        strategy.validate_config()?;
        Ok(strategy)
    }
}

impl Strategy for Breakout {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        let bars = trailing(candles, self.lookback);
        let Some(last) = bars.last() else {
            return Vec::new();
        };

        let max30 = max_high(bars);
        let threshold = max30 * self.proximity_ratio;
        if !(last.close >= threshold || last.high >= threshold) {
            return Vec::new();
        }

        // zero window high: no percentage, no signal
        let Some(over) = percent_change(max30, last.close) else {
            return Vec::new();
        };
        if over > self.max_over_percent {
            return Vec::new();
        }

        debug!(ticker, close = last.close, max30, over, "Breakout");
        vec![AnalysisResult::new(
            ticker,
            bars,
            Setup::Breakout {
                close: last.close,
                high: last.high,
                max30,
                over,
            },
        )]
    }

    fn validate_config(&self) -> Result<()> {
        validate_all(
            BREAKOUT_PARAMS,
            &[
                ("lookback", self.lookback as f64),
                ("proximity_ratio", self.proximity_ratio),
                ("max_over_percent", self.max_over_percent),
            ],
        )
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: Self::KEY.to_string(),
            label: "Breakout".to_string(),
            description: format!(
                "Close or high within {}% of the {}-bar high, close at most {}% above it.",
                ((1.0 - self.proximity_ratio) * 100.0).round(),
                self.lookback,
                self.max_over_percent
            ),
        }
    }
}
