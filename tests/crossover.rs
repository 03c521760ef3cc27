//! SMA 360x50 crossover scanner against constructed series.
//!
//! Every series is flat at 100, falls for 60 bars and then rallies, which
//! pushes SMA50 below SMA360 and back over it.

use std::collections::HashMap;

use setupscan::prelude::*;

fn series(flat: usize, down: usize, drop: f64, up: usize, rise: f64) -> Vec<Candle> {
    let mut closes = vec![100.0; flat];
    for _ in 0..down {
        let last = closes[closes.len() - 1];
        closes.push(last - drop);
    }
    for _ in 0..up {
        let last = closes[closes.len() - 1];
        closes.push(last + rise);
    }
    closes
        .into_iter()
        .enumerate()
        .map(|(i, c)| Candle::new(format!("d{i}"), c, c + 0.5, c - 0.5, c).with_position(i))
        .collect()
}

fn golden() -> Vec<Candle> {
    series(300, 60, 0.5, 35, 3.0)
}

fn death() -> Vec<Candle> {
    series(300, 60, -0.5, 35, -3.0)
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
}

#[test]
fn test_too_short_gives_nothing() {
    let scanner = CrossoverScanner::default();
    let candles = series(10, 0, 0.0, 0, 0.0);
    assert!(scanner.search(&candles, "SBER").is_none());
    assert!(scanner.find_crosses(&candles).is_empty());
    assert!(scanner.analyze(&candles, "SBER").is_empty());
}

#[test]
fn test_flat_series_has_no_cross() {
    let scanner = CrossoverScanner::default();
    let candles = series(400, 0, 0.0, 0, 0.0);
    assert!(scanner.search(&candles, "SBER").is_none());
    assert!(scanner.find_crosses(&candles).is_empty());
}

/// Flat at 100, then `100 - step` and `100 + 2 * step` on the last two bars.
/// The spread flips sign on the final bar with a product of about
/// `-0.0003 * step^2`.
fn late_kink(step: f64) -> Vec<Candle> {
    let mut candles = series(400, 0, 0.0, 0, 0.0);
    for (candle, close) in candles[398..].iter_mut().zip([100.0 - step, 100.0 + 2.0 * step]) {
        *candle = Candle::new(candle.begin.clone(), close, close + 0.5, close - 0.5, close)
            .with_position(candle.position);
    }
    candles
}

#[test]
fn test_tiny_sign_change_is_noise() {
    let scanner = CrossoverScanner::default();
    // product about -7.4e-5, inside the tolerance
    let candles = late_kink(0.5);
    assert!(scanner.search(&candles, "SBER").is_none());
    assert!(scanner.find_crosses(&candles).is_empty());

    let exact = CrossoverScanner {
        tolerance: 0.0,
        ..CrossoverScanner::default()
    };
    assert_eq!(exact.search(&candles, "SBER").unwrap().cross_index, 399);
}

#[test]
fn test_sign_change_beyond_tolerance_is_reported() {
    let scanner = CrossoverScanner::default();
    // product about -3.0e-4
    let candles = late_kink(1.0);

    let hit = scanner.search(&candles, "SBER").unwrap();
    assert_eq!(hit.kind, CrossKind::Gold);
    assert_eq!(hit.cross_index, 399);
    assert_close(hit.price, 100.02);

    let crosses = scanner.find_crosses(&candles);
    assert_eq!(crosses.len(), 1);
    assert_eq!(crosses[0].index, 399);
}

#[test]
fn test_golden_cross() {
    let candles = golden();
    assert_eq!(candles.len(), 395);

    let hit = CrossoverScanner::default().search(&candles, "SBER").unwrap();
    assert_eq!(hit.ticker, "SBER");
    assert_eq!(hit.kind, CrossKind::Gold);
    assert_eq!(hit.cross_index, 389);
    assert_eq!(hit.begin, candles[389].begin);
    assert_close(hit.price, 99.8);
}

#[test]
fn test_death_cross() {
    let candles = death();
    let hit = CrossoverScanner::default().search(&candles, "GAZP").unwrap();
    assert_eq!(hit.kind, CrossKind::Death);
    assert_eq!(hit.cross_index, 389);
    assert_close(hit.price, 100.2);
}

#[test]
fn test_old_cross_is_listed_but_not_searched() {
    let scanner = CrossoverScanner::default();
    let candles = series(300, 60, 0.5, 60, 3.0);

    assert!(scanner.search(&candles, "SBER").is_none());

    let crosses = scanner.find_crosses(&candles);
    assert_eq!(crosses.len(), 1);
    assert_eq!(crosses[0].index, 389);
    assert_eq!(crosses[0].begin, "d389");
    assert_close(crosses[0].price, 99.8);
}

#[test]
fn test_search_agrees_with_listing() {
    let scanner = CrossoverScanner::default();
    for candles in [golden(), death()] {
        let hit = scanner.search(&candles, "X").unwrap();
        let listed = scanner
            .find_crosses(&candles)
            .into_iter()
            .find(|c| c.index == hit.cross_index)
            .unwrap();
        assert_eq!(listed.begin, hit.begin);
        assert_close(listed.price, hit.price);
    }
}

#[test]
fn test_strategy_wraps_search_hit() {
    let candles = golden();
    let results = CrossoverScanner::default().analyze(&candles, "SBER");
    assert_eq!(results.len(), 1);

    let result = &results[0];
    assert_eq!(result.ticker, "SBER");
    assert_eq!(result.candles.len(), 360);
    assert_eq!(result.candles[0].begin, "d35");
    assert_eq!(result.kind(), SignalKind::Gold);
    match &result.setup {
        Setup::SmaCross360x50 {
            kind,
            price,
            cross_index,
        } => {
            assert_eq!(*kind, CrossKind::Gold);
            assert_eq!(*cross_index, 389);
            assert_close(*price, 99.8);
        }
        other => panic!("unexpected setup {other:?}"),
    }
}

#[test]
fn test_setup_serializes_with_tag() {
    let results = CrossoverScanner::default().analyze(&death(), "GAZP");
    let json = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(json["setup"]["setup"], "sma_cross_360x50");
    assert_eq!(json["setup"]["cross_index"], 389);
}

#[test]
fn test_through_registry() {
    let registry = RegistryBuilder::new().add(CrossoverScanner::default()).build().unwrap();

    let mut tickers = HashMap::new();
    tickers.insert("UP".to_string(), golden());
    tickers.insert("DOWN".to_string(), death());
    tickers.insert("SHORT".to_string(), series(10, 0, 0.0, 0, 0.0));

    let results = registry.analyze_all(CrossoverScanner::KEY, &tickers);
    assert_eq!(results["UP"][0].kind(), SignalKind::Gold);
    assert_eq!(results["DOWN"][0].kind(), SignalKind::Death);
    assert!(results["SHORT"].is_empty());
}

#[test]
fn test_params_require_fast_below_slow() {
    let params = HashMap::from([("fast_period", 400.0)]);
    assert!(CrossoverScanner::with_params(&params).is_err());

    let params = HashMap::from([("window", 120.0), ("slow_period", 120.0)]);
    let scanner = CrossoverScanner::with_params(&params).unwrap();
    assert_eq!(scanner.window, 120);
    assert_eq!(scanner.fast_period, 50);
}
