//! Glide v2 - fast and slow SMA hugging each other, then the fast one pulls away

use std::collections::HashMap;

use tracing::debug;

use super::helpers::trailing;
use crate::{
    indicators::{acceleration_direction, is_low_volatility, simple_moving_average, Acceleration},
    params::{
        ensure_known, get_period, get_value, validate_all, ParamMeta, ParameterizedStrategy,
    },
    AnalysisResult, Candle, Result, ScanError, Setup, Side, Strategy, StrategyMetadata,
};

static GLIDE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("lookback", 50.0, (2.0, 1000.0), "Candles considered, also the minimum"),
    ParamMeta::period("fast_period", 18.0, (1.0, 500.0), "Fast SMA period"),
    ParamMeta::period("slow_period", 50.0, (1.0, 500.0), "Slow SMA period"),
    ParamMeta::percent(
        "max_diff_percent",
        0.5,
        (0.0, 100.0),
        "Largest spread between the averages, % of their midpoint",
    ),
];

#[derive(Debug, Clone)]
pub struct GlideV2 {
    pub lookback: usize,
    pub fast_period: usize,
    pub slow_period: usize,
    pub max_diff_percent: f64,
}

impl Default for GlideV2 {
    fn default() -> Self {
        Self {
            lookback: 50,
            fast_period: 18,
            slow_period: 50,
            max_diff_percent: 0.5,
        }
    }
}

impl ParameterizedStrategy for GlideV2 {
    const KEY: &'static str = "glide_v2";

    fn param_meta() -> &'static [ParamMeta] {
        GLIDE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        ensure_known(params, GLIDE_PARAMS)?;
        let strategy = Self {
            lookback: get_period(params, GLIDE_PARAMS, "lookback")?,
            fast_period: get_period(params, GLIDE_PARAMS, "fast_period")?,
            slow_period: get_period(params, GLIDE_PARAMS, "slow_period")?,
            max_diff_percent: get_value(params, GLIDE_PARAMS, "max_diff_percent")?,
        };
        strategy.validate_config()?;
        Ok(strategy)
    }
}

impl Strategy for GlideV2 {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn min_candles(&self) -> usize {
        self.lookback
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        if candles.len() < self.min_candles() {
            return Vec::new();
        }
        let window = trailing(candles, self.lookback);

        let fast = simple_moving_average(window, self.fast_period);
        let slow = simple_moving_average(window, self.slow_period);
        if !is_low_volatility(&fast, &slow, self.max_diff_percent) {
            return Vec::new();
        }

        let (Some(fast_last), Some(slow_last)) = (fast.last(), slow.last()) else {
            return Vec::new();
        };
        let acceleration = acceleration_direction(&fast, &slow);

        let side = match acceleration {
            Acceleration::Up if fast_last.value > slow_last.value => Side::Long,
            Acceleration::Down if fast_last.value < slow_last.value => Side::Short,
            _ => return Vec::new(),
        };

        debug!(
            ticker,
            ?side,
            sma_fast = fast_last.value,
            sma_slow = slow_last.value,
            "Glide"
        );
        vec![AnalysisResult::new(
            ticker,
            window,
            Setup::Glide {
                side,
                sma_fast: fast_last.value,
                sma_slow: slow_last.value,
                acceleration,
            },
        )]
    }

    fn validate_config(&self) -> Result<()> {
        validate_all(
            GLIDE_PARAMS,
            &[
                ("lookback", self.lookback as f64),
                ("fast_period", self.fast_period as f64),
                ("slow_period", self.slow_period as f64),
                ("max_diff_percent", self.max_diff_percent),
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
            label: "Glide v2".to_string(),
            description: format!(
                "SMA{} and SMA{} within {}% of each other over the last {} bars; LONG when the \
                 fast average is above and accelerating up, SHORT when below and accelerating down.",
                self.fast_period, self.slow_period, self.max_diff_percent, self.lookback
            ),
        }
    }
}
