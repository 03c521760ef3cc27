//! Integration tests for the strategy registry and batch scanning.

use std::collections::HashMap;

use setupscan::prelude::*;

/// Ascending series that ends in a turtle LONG breakout
fn breakout_candles() -> Vec<Candle> {
    let mut candles: Vec<Candle> = (0..30)
        .map(|i| {
            let close = 104.0 + i as f64;
            Candle::new(format!("d{i}"), close - 0.5, close + 1.0, close - 1.0, close)
                .with_position(i)
        })
        .collect();
    candles.push(Candle::new("d30", 135.5, 137.0, 135.0, 136.0).with_position(30));
    candles
}

fn nan_candles() -> Vec<Candle> {
    let mut candles = breakout_candles();
    candles[12].close = f64::NAN;
    candles
}

/// Panics for one ticker, reports nothing for the rest
struct Fragile;

impl Strategy for Fragile {
    fn name(&self) -> &str {
        "fragile"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn analyze(&self, _candles: &[Candle], ticker: &str) -> Vec<AnalysisResult> {
        if ticker == "BAD" {
            panic!("cannot analyze {ticker}");
        }
        Vec::new()
    }
}

/// Fixed-name strategy for ordering tests
struct Named(&'static str, usize);

impl Strategy for Named {
    fn name(&self) -> &str {
        self.0
    }

    fn lookback(&self) -> usize {
        self.1
    }

    fn analyze(&self, _candles: &[Candle], _ticker: &str) -> Vec<AnalysisResult> {
        Vec::new()
    }
}

// ============================================================
// LOOKUP AND LISTING
// ============================================================

#[test]
fn test_defaults_listing_order() {
    let registry = RegistryBuilder::new().with_all_defaults().build().unwrap();
    assert_eq!(
        registry.names(),
        vec![
            "turtle_breakout",
            "low_volatility_gap",
            "glide_v2",
            "u_pattern",
            "oops",
            "sma_365x50",
            "breakout",
        ]
    );
    assert_eq!(registry.list_all().len(), 7);
    assert!(registry.get("u_pattern").is_some());
    assert!(registry.get("sma_cross_360x50").is_none());
}

#[test]
fn test_metadata_for_presentation() {
    let registry = StrategyRegistry::with_defaults();
    let metadata = registry.metadata();
    assert_eq!(metadata.len(), 7);
    assert!(metadata.iter().all(|m| !m.label.is_empty() && !m.description.is_empty()));

    let json = serde_json::to_value(&metadata[0]).unwrap();
    assert_eq!(json["name"], "turtle_breakout");
}

#[test]
fn test_register_overwrites_in_place() {
    let mut registry = StrategyRegistry::new();
    registry.register(Named("alpha", 1));
    registry.register(Named("beta", 2));
    registry.register(Named("alpha", 3));

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names(), vec!["alpha", "beta"]);
    assert_eq!(registry.get("alpha").unwrap().lookback(), 3);
}

#[test]
fn test_builder_accepts_custom_strategies() {
    let registry = RegistryBuilder::new()
        .add(TurtleBreakout::default())
        .add_boxed(Box::new(Fragile))
        .build()
        .unwrap();
    assert_eq!(registry.names(), vec!["turtle_breakout", "fragile"]);
}

// ============================================================
// SINGLE-TICKER DISPATCH
// ============================================================

#[test]
fn test_analyze_delegates() {
    let registry = StrategyRegistry::with_defaults();
    let results = registry.analyze("turtle_breakout", &breakout_candles(), "SBER").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry(), Some(136.0));
}

#[test]
fn test_analyze_unknown_strategy() {
    let registry = StrategyRegistry::with_defaults();
    match registry.analyze("does-not-exist", &breakout_candles(), "X") {
        Err(ScanError::UnknownStrategy(name)) => assert_eq!(name, "does-not-exist"),
        other => panic!("expected UnknownStrategy, got {other:?}"),
    }
}

#[test]
fn test_analyze_rejects_non_finite_candles() {
    let registry = StrategyRegistry::with_defaults();
    match registry.analyze("turtle_breakout", &nan_candles(), "X") {
        Err(ScanError::InvalidCandle { index, .. }) => assert_eq!(index, 12),
        other => panic!("expected InvalidCandle, got {other:?}"),
    }
}

#[test]
fn test_validation_can_be_disabled() {
    let registry = RegistryBuilder::new()
        .add(Breakout::default())
        .validate_data(false)
        .build()
        .unwrap();
    assert!(!registry.validates_data());
    assert!(registry.analyze("breakout", &nan_candles(), "X").is_ok());
}

// ============================================================
// BATCH
// ============================================================

#[test]
fn test_batch_isolates_bad_ticker() {
    let registry = StrategyRegistry::with_defaults();
    let mut tickers = HashMap::new();
    tickers.insert("A".to_string(), breakout_candles());
    tickers.insert("B".to_string(), nan_candles());

    let results = registry.analyze_all("turtle_breakout", &tickers);
    assert_eq!(results.len(), 2);
    assert_eq!(results["A"].len(), 1);
    assert_eq!(results["A"][0].kind(), SignalKind::Long);
    assert!(results["B"].is_empty());
}

#[test]
fn test_batch_survives_panics() {
    let registry = RegistryBuilder::new().add(Fragile).build().unwrap();
    let candles = breakout_candles();
    let good = candles.as_slice();
    let instruments = vec![("GOOD", good), ("BAD", good), ("ALSO_GOOD", good)];

    let report = registry.analyze_batch("fragile", instruments);
    assert_eq!(report.results.len(), 3);
    assert!(report.results["BAD"].is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].ticker, "BAD");
    assert!(report.failures[0].reason.contains("cannot analyze BAD"));
}

#[test]
fn test_batch_skips_empty_tickers() {
    let registry = StrategyRegistry::with_defaults();
    let mut tickers = HashMap::new();
    tickers.insert("A".to_string(), breakout_candles());
    tickers.insert("EMPTY".to_string(), Vec::new());

    let results = registry.analyze_all("turtle_breakout", &tickers);
    assert!(results.contains_key("A"));
    assert!(!results.contains_key("EMPTY"));
}

#[test]
fn test_batch_unknown_strategy_degrades_to_empty() {
    let registry = StrategyRegistry::with_defaults();
    let candles = breakout_candles();
    let report = registry.analyze_batch("nope", vec![("A", candles.as_slice())]);
    assert!(report.results["A"].is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.signal_count(), 0);
}

#[test]
fn test_analyze_everything() {
    let registry = StrategyRegistry::with_defaults();
    let mut tickers = HashMap::new();
    tickers.insert("A".to_string(), breakout_candles());
    tickers.insert("B".to_string(), nan_candles());

    let all = registry.analyze_everything(&tickers);
    assert_eq!(all.len(), 7);
    for (name, per_ticker) in &all {
        assert_eq!(per_ticker.len(), 2, "strategy {name}");
        assert!(per_ticker["B"].is_empty(), "strategy {name}");
    }
    assert_eq!(all["turtle_breakout"]["A"].len(), 1);
}

// ============================================================
// CONFIG
// ============================================================

#[test]
fn test_registry_from_config() {
    let config = ScannerConfig::from_toml_str(
        r#"
        [[strategy]]
        type = "sma_cross_360x50"

        [[strategy]]
        type = "turtle_breakout"
        [strategy.params]
        signal_window = 10
        "#,
    )
    .unwrap();

    let registry = StrategyRegistry::from_config(&config).unwrap();
    assert_eq!(registry.names(), vec!["sma_cross_360x50", "turtle_breakout"]);

    let results = registry.analyze("turtle_breakout", &breakout_candles(), "X").unwrap();
    assert_eq!(results[0].candles.len(), 10);
}

#[test]
fn test_registry_from_empty_config_uses_defaults() {
    let registry = StrategyRegistry::from_config(&ScannerConfig::default()).unwrap();
    assert_eq!(registry.len(), 7);
}

#[test]
fn test_registry_from_config_rejects_unknown_type() {
    let config = ScannerConfig::from_toml_str("[[strategy]]\ntype = \"grid\"\n").unwrap();
    assert!(matches!(
        StrategyRegistry::from_config(&config),
        Err(ScanError::InvalidConfig(_))
    ));
}
