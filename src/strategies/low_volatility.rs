//! Low-Volatility Micro-Gap - a short run of tiny same-colored bodies that
//! gap a little in the direction of the run.

use std::collections::HashMap;

use tracing::debug;

use super::helpers::{body_percent, percent_change, trailing};
use crate::{
    params::{
        ensure_known, get_period, get_value, validate_all, ParamMeta, ParameterizedStrategy,
    },
    AnalysisResult, Candle, Result, ScanError, Setup, Side, Strategy, StrategyMetadata,
};

static LOW_VOLATILITY_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("lookback", 30.0, (1.0, 1000.0), "Candles considered"),
    ParamMeta::period("max_run", 5.0, (1.0, 50.0), "Longest run tried first"),
    ParamMeta::period("min_run", 3.0, (1.0, 50.0), "Shortest run tried last"),
    ParamMeta::percent("max_body_percent", 2.0, (0.0, 100.0), "Largest body, % of open"),
    ParamMeta::percent("min_gap_percent", 0.1, (0.0, 100.0), "Smallest gap, % of prior close"),
    ParamMeta::percent("max_gap_percent", 1.0, (0.0, 100.0), "Largest gap, % of prior close"),
];

/// Runs of `min_run..=max_run` trailing candles, longest first. The first run
/// that qualifies wins.
#[derive(Debug, Clone)]
pub struct LowVolatilityGap {
    pub lookback: usize,
    pub max_run: usize,
    pub min_run: usize,
    pub max_body_percent: f64,
    pub min_gap_percent: f64,
    pub max_gap_percent: f64,
}

impl Default for LowVolatilityGap {
    fn default() -> Self {
        Self {
            lookback: 30,
            max_run: 5,
            min_run: 3,
            max_body_percent: 2.0,
            min_gap_percent: 0.1,
            max_gap_percent: 1.0,
        }
    }
}

impl LowVolatilityGap {
    fn gap_ok(&self, side: Side, gap: f64) -> bool {
        match side {
            Side::Long => (self.min_gap_percent..=self.max_gap_percent).contains(&gap),
            Side::Short => (-self.max_gap_percent..=-self.min_gap_percent).contains(&gap),
        }
    }

    /// Direction of a qualifying run, if any
    fn qualify(&self, run: &[Candle]) -> Option<Side> {
        let small_bodies = run.iter().all(|c| {
            body_percent(c).is_some_and(|pct| (0.0..=self.max_body_percent).contains(&pct))
        });
        if !small_bodies {
            return None;
        }

        let side = if run.iter().all(Candle::is_green) {
            Side::Long
        } else if run.iter().all(Candle::is_red) {
            Side::Short
        } else {
            return None;
        };

        let gaps_ok = run.windows(2).all(|w| {
            percent_change(w[0].close, w[1].open).is_some_and(|gap| self.gap_ok(side, gap))
        });
        gaps_ok.then_some(side)
    }
}

impl ParameterizedStrategy for LowVolatilityGap {
    const KEY: &'static str = "low_volatility_gap";

    fn param_meta() -> &'static [ParamMeta] {
        LOW_VOLATILITY_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        ensure_known(params, LOW_VOLATILITY_PARAMS)?;
        let strategy = Self {
            lookback: get_period(params, LOW_VOLATILITY_PARAMS, "lookback")?,
            max_run: get_period(params, LOW_VOLATILITY_PARAMS, "max_run")?,
            min_run: get_period(params, LOW_VOLATILITY_PARAMS, "min_run")?,
            max_body_percent: get_value(params, LOW_VOLATILITY_PARAMS, "max_body_percent")?,
            min_gap_percent: get_value(params, LOW_VOLATILITY_PARAMS, "min_gap_percent")?,
            max_gap_percent: get_value(params, LOW_VOLATILITY_PARAMS, "max_gap_percent")?,
        };
        strategy.validate_config()?;
        Ok(strategy)
    }
}

impl Strategy for LowVolatilityGap {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn min_candles(&self) -> usize {
        self.min_run
    }

    fn analyze(&self, candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        let bars = trailing(candles, self.lookback);

        for count in (self.min_run..=self.max_run).rev() {
            if bars.len() < count {
                continue;
            }
            let run = trailing(bars, count);
            let Some(side) = self.qualify(run) else {
                continue;
            };

            let tail = trailing(run, 2);
            let stop = match side {
                Side::Long => tail.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
                Side::Short => tail.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
            };
            let entry = run[run.len() - 1].close;

            debug!(ticker, ?side, count, entry, stop, "Low-volatility gap run");
            return vec![AnalysisResult::new(
                ticker,
                run,
                Setup::LowVolatility {
                    side,
                    entry,
                    stop,
                    count,
                },
            )];
        }

        Vec::new()
    }

    fn validate_config(&self) -> Result<()> {
        validate_all(
            LOW_VOLATILITY_PARAMS,
            &[
                ("lookback", self.lookback as f64),
                ("max_run", self.max_run as f64),
                ("min_run", self.min_run as f64),
                ("max_body_percent", self.max_body_percent),
                ("min_gap_percent", self.min_gap_percent),
                ("max_gap_percent", self.max_gap_percent),
            ],
        )?;
        if self.min_run > self.max_run {
            return Err(ScanError::InvalidConfig("min_run must not exceed max_run".into()));
        }
        if self.min_gap_percent > self.max_gap_percent {
            return Err(ScanError::InvalidConfig(
                "min_gap_percent must not exceed max_gap_percent".into(),
            ));
        }
        Ok(())
    }

    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: Self::KEY.to_string(),
            label: "Low volatility + micro gaps".to_string(),
            description: format!(
                "{}-{} trailing candles, bodies within {}% of open, all green or all red, \
                 gaps of {}-{}% in the run direction; stop beyond the last two candles.",
                self.min_run,
                self.max_run,
                self.max_body_percent,
                self.min_gap_percent,
                self.max_gap_percent
            ),
        }
    }
}
