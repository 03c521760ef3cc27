//! Strategy registry: name → strategy, listing and dispatch
//!
//! The registry is built once and then only read. Batch scans run one unit
//! of work per ticker on the rayon pool; each unit is isolated, so an error
//! or a panic while analysing one ticker becomes an empty result for that
//! ticker and never touches its siblings.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    config::ScannerConfig, validate_candles, AnalysisResult, BuiltinStrategy, Candle, Result,
    ScanError, Strategy, StrategyMetadata,
};

// ============================================================
// REGISTRY
// ============================================================

pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
    index: HashMap<String, usize>,
    validate_data: bool,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .field("validate_data", &self.validate_data)
            .finish()
    }
}

impl StrategyRegistry {
    /// Empty registry with data validation on
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            index: HashMap::new(),
            validate_data: true,
        }
    }

    /// Registry holding the seven default setups
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for strategy in BuiltinStrategy::defaults() {
            registry.register(strategy);
        }
        registry
    }

    /// Build from a scanner config; an empty strategy list means the defaults.
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        let mut registry = if config.strategies.is_empty() {
            Self::with_defaults()
        } else {
            let mut registry = Self::new();
            for cfg in &config.strategies {
                registry.register(cfg.build()?);
            }
            registry
        };
        registry.validate_data = config.validate_data;
        info!(
            strategies = registry.len(),
            validate_data = registry.validate_data,
            "Strategy registry built from config"
        );
        Ok(registry)
    }

    /// Insert a strategy, replacing any previous one with the same name.
    pub fn register<S: Strategy + 'static>(&mut self, strategy: S) {
        self.register_boxed(Box::new(strategy));
    }

    /// Boxed form of [`register`](Self::register). A replacement keeps the
    /// listing position of the strategy it replaces.
    pub fn register_boxed(&mut self, strategy: Box<dyn Strategy>) {
        let name = strategy.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                warn!(name = %name, "Replacing registered strategy");
                self.strategies[slot] = strategy;
            }
            None => {
                info!(name = %name, "Registered strategy");
                self.index.insert(name, self.strategies.len());
                self.strategies.push(strategy);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Strategy> {
        self.index.get(name).map(|&slot| self.strategies[slot].as_ref())
    }

    /// Strategies in registration order
    pub fn list_all(&self) -> Vec<&dyn Strategy> {
        self.strategies.iter().map(|s| s.as_ref()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Presentation metadata, in registration order
    pub fn metadata(&self) -> Vec<StrategyMetadata> {
        self.strategies.iter().map(|s| s.metadata()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn validates_data(&self) -> bool {
        self.validate_data
    }

    // ============================================================
    // DISPATCH
    // ============================================================

    /// Run one strategy over one ticker's candles.
    ///
    /// # Errors
    ///
    /// [`ScanError::UnknownStrategy`] when `name` is not registered, and
    /// [`ScanError::InvalidCandle`] for non-finite prices when data
    /// validation is on. No partial result is returned in either case.
    pub fn analyze(
        &self,
        name: &str,
        candles: &[Candle],
        ticker: &str,
    ) -> Result<Vec<AnalysisResult>> {
        let strategy = self
            .get(name)
            .ok_or_else(|| ScanError::UnknownStrategy(name.to_string()))?;

        if self.validate_data {
            validate_candles(candles)?;
        }

        let results = strategy.analyze(candles, ticker);
        debug!(
            strategy = name,
            ticker,
            candles = candles.len(),
            signals = results.len(),
            "Analyzed"
        );
        Ok(results)
    }

    /// Run one strategy over many tickers in parallel.
    ///
    /// Tickers with no candles are skipped. Every other ticker gets an
    /// entry in [`BatchReport::results`]; failed ones get an empty list and
    /// a [`TickerFailure`].
    pub fn analyze_batch<'a, I>(&self, name: &str, instruments: I) -> BatchReport
    where
        I: IntoParallelIterator<Item = (&'a str, &'a [Candle])>,
    {
        let outcomes: Vec<(String, TickerOutcome)> = instruments
            .into_par_iter()
            .filter(|(_, candles)| !candles.is_empty())
            .map(|(ticker, candles)| {
                let caught =
                    panic::catch_unwind(AssertUnwindSafe(|| self.analyze(name, candles, ticker)));
                let outcome = match caught {
                    Ok(Ok(results)) => Ok(results),
                    Ok(Err(error)) => Err(error.to_string()),
                    Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
                };
                (ticker.to_string(), outcome)
            })
            .collect();

        let mut report = BatchReport::default();
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(results) => {
                    report.results.insert(ticker, results);
                }
                Err(reason) => {
                    warn!(
                        strategy = name,
                        ticker = %ticker,
                        reason = %reason,
                        "Ticker analysis failed"
                    );
                    report.results.insert(ticker.clone(), Vec::new());
                    report.failures.push(TickerFailure { ticker, reason });
                }
            }
        }
        report
    }

    /// Run one strategy over every ticker; failures degrade to empty lists.
    pub fn analyze_all(
        &self,
        name: &str,
        tickers: &HashMap<String, Vec<Candle>>,
    ) -> HashMap<String, Vec<AnalysisResult>> {
        let instruments = tickers
            .par_iter()
            .map(|(ticker, candles)| (ticker.as_str(), candles.as_slice()));
        self.analyze_batch(name, instruments).results
    }

    /// Every registered strategy over every ticker, keyed by strategy name.
    pub fn analyze_everything(
        &self,
        tickers: &HashMap<String, Vec<Candle>>,
    ) -> HashMap<String, HashMap<String, Vec<AnalysisResult>>> {
        self.strategies
            .iter()
            .map(|s| (s.name().to_string(), self.analyze_all(s.name(), tickers)))
            .collect()
    }
}

type TickerOutcome = std::result::Result<Vec<AnalysisResult>, String>;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

// ============================================================
// BATCH REPORT
// ============================================================

/// One ticker that failed during a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerFailure {
    pub ticker: String,
    pub reason: String,
}

/// Outcome of a batch scan
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Every ticker with candle data, failed ones mapped to an empty list
    pub results: HashMap<String, Vec<AnalysisResult>>,
    pub failures: Vec<TickerFailure>,
}

impl BatchReport {
    /// Total number of signals across all tickers
    pub fn signal_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating [`StrategyRegistry`] instances
pub struct RegistryBuilder {
    strategies: Vec<Box<dyn Strategy>>,
    validate_data: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            validate_data: true,
        }
    }

    /// Add the seven default setups
    pub fn with_all_defaults(mut self) -> Self {
        self.strategies.extend(
            BuiltinStrategy::defaults()
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn Strategy>),
        );
        self
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<S: Strategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn add_boxed(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Enable/disable candle validation before dispatch
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.validate_data = enable;
        self
    }

    /// Validate every strategy's configuration and build the registry
    pub fn build(self) -> Result<StrategyRegistry> {
        let mut registry = StrategyRegistry::new();
        registry.validate_data = self.validate_data;
        for strategy in self.strategies {
            strategy.validate_config()?;
            registry.register_boxed(strategy);
        }
        info!(strategies = registry.len(), "Strategy registry built");
        Ok(registry)
    }
}
