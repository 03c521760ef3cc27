//! SMA 365x50 cross - fresh golden or death cross of the yearly and the
//! 50-bar average within the last few bars.

use std::collections::HashMap;

use tracing::debug;

use super::helpers::trailing;
use crate::{
    indicators::full_window_sma,
    params::{ensure_known, get_period, validate_all, ParamMeta, ParameterizedStrategy},
    AnalysisResult, Candle, CrossKind, Result, ScanError, Setup, Strategy, StrategyMetadata,
};

static SMA_365X50_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("lookback", 379.0, (2.0, 5000.0), "Candles considered"),
    ParamMeta::period("fast_period", 50.0, (1.0, 5000.0), "Fast SMA period"),
    ParamMeta::period("slow_period", 365.0, (1.0, 5000.0), "Slow SMA period, also the minimum"),
    ParamMeta::period("search_window", 15.0, (1.0, 500.0), "Trailing bars searched for a cross"),
];

#[derive(Debug, Clone)]
pub struct SmaCross365x50 {
    pub lookback: usize,
    pub fast_period: usize,
    pub slow_period: usize,
    pub search_window: usize,
}

impl Default for SmaCross365x50 {
    fn default() -> Self {
        Self {
            lookback: 379,
            fast_period: 50,
            slow_period: 365,
            search_window: 15,
        }
    }
}

impl SmaCross365x50 {
    /// First cross in the trailing search window, oldest to newest
    fn first_cross(&self, fast: &[Option<f64>], slow: &[Option<f64>]) -> Option<(usize, CrossKind)> {
        let n = fast.len().checked_sub(1)?;
        let start = (n + 1).saturating_sub(self.search_window).max(1);

        (start..=n).find_map(|t| {
            let (f0, f1) = (fast[t - 1]?, fast[t]?);
            let (s0, s1) = (slow[t - 1]?, slow[t]?);
            if f0 <= s0 && f1 > s1 {
                Some((t, CrossKind::Gold))
            } else if f0 >= s0 && f1 < s1 {
                Some((t, CrossKind::Death))
            } else {
                None
            }
        })
    }
}

impl ParameterizedStrategy for SmaCross365x50 {
    const KEY: &'static str = "sma_365x50";

    fn param_meta() -> &'static [ParamMeta] {
        SMA_365X50_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        ensure_known(params, SMA_365X50_PARAMS)?;
        let strategy = Self {
            lookback: get_period(params, SMA_365X50_PARAMS, "lookback")?,
            fast_period: get_period(params, SMA_365X50_PARAMS, "fast_period")?,
            slow_period: get_period(params, SMA_365X50_PARAMS, "slow_period")?,
            search_window: get_period(params, SMA_365X50_PARAMS, "search_window")?,
        };
        strategy.validate_config()?;
        Ok(strategy)
    }
}

impl Strategy for SmaCross365x50 {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn min_candles(&self) -> usize {
        self.slow_period
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        let bars = trailing(candles, self.lookback);
        if bars.len() < self.min_candles() {
            return Vec::new();
        }

        let closes: Vec<f64> = bars.iter().map(|c| c.close).collect();
        let fast = full_window_sma(&closes, self.fast_period);
        let slow = full_window_sma(&closes, self.slow_period);

        let Some((t, kind)) = self.first_cross(&fast, &slow) else {
            return Vec::new();
        };
        let (Some(sma50), Some(sma365)) = (fast[t], slow[t]) else {
            return Vec::new();
        };

        debug!(ticker, ?kind, t, sma50, sma365, "SMA 365x50 cross");
        vec![AnalysisResult::new(
            ticker,
            bars,
            Setup::SmaCross365x50 {
                kind,
                t,
                sma50,
                sma365,
            },
        )]
    }

    fn validate_config(&self) -> Result<()> {
        validate_all(
            SMA_365X50_PARAMS,
            &[
                ("lookback", self.lookback as f64),
                ("fast_period", self.fast_period as f64),
                ("slow_period", self.slow_period as f64),
                ("search_window", self.search_window as f64),
            ],
        )?;
        if self.fast_period >= self.slow_period {
            return Err(ScanError::InvalidConfig(
                "fast_period must be shorter than slow_period".into(),
            ));
        }
        if self.lookback < self.slow_period {
            return Err(ScanError::InvalidConfig(
                "lookback must cover slow_period".into(),
            ));
        }
        Ok(())
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: Self::KEY.to_string(),
            label: "365 x 50".to_string(),
            description: format!(
                "SMA{} crossing SMA{} within the last {} bars: gold when crossing up, death when \
                 crossing down. Needs {} bars.",
                self.fast_period, self.slow_period, self.search_window, self.slow_period
            ),
        }
    }
}
