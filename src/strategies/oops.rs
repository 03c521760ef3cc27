//! Oops reversal - a bar closes beyond the prior range, the next bar
//! reverses back through its body.

use std::collections::HashMap;

use tracing::debug;

use super::helpers::{max_high, min_low, trailing};
use crate::{
    params::{
        ensure_known, get_period, get_value, validate_all, ParamMeta, ParameterizedStrategy,
    },
    AnalysisResult, Bias, Candle, Result, Setup, Strategy, StrategyMetadata,
};

static OOPS_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("lookback", 40.0, (3.0, 1000.0), "Candles considered and range length"),
    ParamMeta::price("delta", 0.001, (0.0, 1000.0), "Reversal must pierce the body by this"),
    ParamMeta::price("epsilon", 0.001, (0.0, 1000.0), "Stop offset beyond the signal bar"),
    ParamMeta::ratio("reward_ratio", 2.0, (0.1, 20.0), "Target distance in stop distances"),
];

/// Both biases are checked independently; a call may return zero, one or
/// two results.
#[derive(Debug, Clone)]
pub struct OopsReversal {
    pub lookback: usize,
    pub delta: f64,
    pub epsilon: f64,
    pub reward_ratio: f64,
}

impl Default for OopsReversal {
    fn default() -> Self {
        Self {
            lookback: 40,
            delta: 0.001,
            epsilon: 0.001,
            reward_ratio: 2.0,
        }
    }
}

impl OopsReversal {
    fn result(
        &self,
        ticker: &str,
        bars: &[Candle],
        bias: Bias,
        entry: f64,
        stop_loss: f64,
    ) -> AnalysisResult {
        let take_profit = entry + self.reward_ratio * (stop_loss - entry);
        debug!(ticker, ?bias, entry, stop_loss, take_profit, "Oops reversal");
        AnalysisResult::new(
            ticker,
            bars,
            Setup::Oops {
                bias,
                entry,
                stop_loss,
                take_profit,
            },
        )
    }
}

impl ParameterizedStrategy for OopsReversal {
    const KEY: &'static str = "oops";

    fn param_meta() -> &'static [ParamMeta] {
        OOPS_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        ensure_known(params, OOPS_PARAMS)?;
        let strategy = Self {
            lookback: get_period(params, OOPS_PARAMS, "lookback")?,
            delta: get_value(params, OOPS_PARAMS, "delta")?,
            epsilon: get_value(params, OOPS_PARAMS, "epsilon")?,
            reward_ratio: get_value(params, OOPS_PARAMS, "reward_ratio")?,
        };
        strategy.validate_config()?;
        Ok(strategy)
    }
}

impl Strategy for OopsReversal {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn min_candles(&self) -> usize {
        3
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        let bars = trailing(candles, self.lookback);
        if bars.len() < self.min_candles() {
            return Vec::new();
        }

        let n = bars.len() - 1;
        let i1 = n - 1;
        let range = &bars[i1.saturating_sub(self.lookback)..i1];
        let h_max = max_high(range);
        let l_min = min_low(range);

        let (signal, last) = (&bars[i1], &bars[n]);
        let mut results = Vec::new();

        if signal.high > h_max
            && signal.close > h_max
            && last.low <= signal.body_bottom() - self.delta
            && last.close < signal.close
        {
            let stop_loss = signal.low - self.epsilon;
            results.push(self.result(ticker, bars, Bias::Bullish, last.close, stop_loss));
        }

        if signal.low < l_min
            && signal.close < l_min
            && last.high >= signal.body_top() + self.delta
            && last.close > signal.close
        {
            let stop_loss = signal.high + self.epsilon;
            results.push(self.result(ticker, bars, Bias::Bearish, last.close, stop_loss));
        }

        results
    }

    fn validate_config(&self) -> Result<()> {
        validate_all(
            OOPS_PARAMS,
            &[
                ("lookback", self.lookback as f64),
                ("delta", self.delta),
                ("epsilon", self.epsilon),
                ("reward_ratio", self.reward_ratio),
            ],
        )
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: Self::KEY.to_string(),
            label: "Oops".to_string(),
            description: format!(
                "Previous bar closes beyond the {}-bar range, last bar reverses through its body; \
                 stop beyond the previous bar, target {}x the stop distance.",
                self.lookback, self.reward_ratio
            ),
        }
    }
}
