use std::time::Duration;

use rlboard::config::BacktestConfig;
use rlboard::domain::{TradeAction, TradeFilter};
use rlboard::store::{BacktestState, BacktestStore};

fn empty_store() -> BacktestStore {
    BacktestStore::new(
        BacktestState {
            result: None,
            is_loading: false,
            error: None,
        },
        &BacktestConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn run_backtest_loads_then_reports() {
    let store = empty_store();
    let _handle = store.run_backtest("exp-1", "Test");
    assert!(store.is_loading());
    assert!(store.snapshot().result.is_none());

    tokio::time::sleep(Duration::from_millis(1999)).await;
    assert!(store.is_loading());

    tokio::time::sleep(Duration::from_millis(2)).await;
    let s = store.snapshot();
    assert!(!s.is_loading);
    let result = s.result.expect("report after delay");
    assert_eq!(result.experiment_id, "exp-1");
    assert_eq!(result.experiment_name, "Test");
}

#[tokio::test(start_paused = true)]
async fn overlapping_runs_last_timer_wins() {
    let store = empty_store();
    let first = store.run_backtest("exp-a", "A");
    tokio::time::sleep(Duration::from_millis(500)).await;
    let second = store.run_backtest("exp-b", "B");

    first.await.unwrap();
    assert!(!store.is_loading());
    assert_eq!(store.snapshot().result.unwrap().experiment_id, "exp-a");

    second.await.unwrap();
    assert_eq!(store.snapshot().result.unwrap().experiment_id, "exp-b");
}

#[test]
fn trade_filters_combine() {
    let store = BacktestStore::demo(&BacktestConfig::default());
    let all = store.filtered_trades(TradeFilter::default());

    let short_winners = store.filtered_trades(TradeFilter {
        action: Some(TradeAction::Short),
        pnl_positive: Some(true),
    });
    assert!(short_winners.iter().all(|t| t.action == TradeAction::Short && t.pnl > 0.0));
    let expected = all
        .iter()
        .filter(|t| t.action == TradeAction::Short && t.pnl > 0.0)
        .count();
    assert_eq!(short_winners.len(), expected);
}

#[test]
fn monthly_returns_span_two_years() {
    let store = BacktestStore::demo(&BacktestConfig::default());
    assert_eq!(store.monthly_returns_for_year(2024).len(), 7);
    assert_eq!(store.monthly_returns_for_year(2025).len(), 12);
    assert!(store.monthly_returns_for_year(2023).is_empty());
}
