//! Backtest result store
//!
//! Holds one complete report at a time. A run replaces the report wholesale
//! after a simulated delay. Runs are never cancelled: if two overlap, the
//! one whose timer fires last wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::observable::{Store, Subscription};
use crate::config::BacktestConfig;
use crate::domain::{BacktestResult, MonthlyReturn, SummaryStats, Trade, TradeFilter};
use crate::mock::generate_backtest_result;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestState {
    pub result: Option<BacktestResult>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl BacktestState {
    /// Seed state showing the report of the first demo experiment
    pub fn demo() -> Self {
        let mut result = generate_backtest_result(
            &mut rand::thread_rng(),
            "exp-001",
            crate::domain::DEFAULT_EXPERIMENT_NAME,
            Utc::now(),
        );
        result.id = "bt-001".to_string();

        Self {
            result: Some(result),
            is_loading: false,
            error: None,
        }
    }
}

#[derive(Clone)]
pub struct BacktestStore {
    state: Store<BacktestState>,
    delay: Duration,
    runs: Arc<AtomicU64>,
}

impl BacktestStore {
    pub fn new(initial: BacktestState, config: &BacktestConfig) -> Self {
        Self {
            state: Store::new(initial),
            delay: Duration::from_millis(config.simulated_delay_ms),
            runs: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn demo(config: &BacktestConfig) -> Self {
        Self::new(BacktestState::demo(), config)
    }

    pub fn snapshot(&self) -> BacktestState {
        self.state.get()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read(|s| s.is_loading)
    }

    pub fn store(&self) -> &Store<BacktestState> {
        &self.state
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&BacktestState) + Send + Sync + 'static,
    {
        self.state.subscribe(listener)
    }

    /// Mark the store loading and schedule a fresh mock report.
    ///
    /// Must be called inside a tokio runtime. The returned handle may be
    /// awaited or dropped; dropping it does not cancel the run.
    pub fn run_backtest(&self, experiment_id: &str, experiment_name: &str) -> JoinHandle<()> {
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        info!(run, experiment_id, experiment_name, delay_ms = self.delay.as_millis() as u64, "Backtest started");

        let state = self.state.clone();
        let delay = self.delay;
        let experiment_id = experiment_id.to_string();
        let experiment_name = experiment_name.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let result = generate_backtest_result(
                &mut rand::thread_rng(),
                &experiment_id,
                &experiment_name,
                Utc::now(),
            );
            debug!(run, id = %result.id, trades = result.trades.len(), "Backtest report generated");

            state.update(|s| {
                s.is_loading = false;
                s.result = Some(result);
            });
            info!(run, experiment_id = %experiment_id, "Backtest finished");
        })
    }

    pub fn clear_result(&self) {
        self.state.update(|s| {
            s.result = None;
            s.error = None;
        });
    }

    // Read-side analytics over the current report; empty when there is none

    pub fn filtered_trades(&self, filter: TradeFilter) -> Vec<Trade> {
        self.state.read(|s| {
            s.result
                .as_ref()
                .map(|r| r.filtered_trades(filter).into_iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn monthly_returns_for_year(&self, year: i32) -> Vec<MonthlyReturn> {
        self.state.read(|s| {
            s.result
                .as_ref()
                .map(|r| r.monthly_returns_for_year(year).into_iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn summary_stats(&self) -> Option<SummaryStats> {
        self.state.read(|s| s.result.as_ref().map(BacktestResult::summary_stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ms: u64) -> BacktestConfig {
        BacktestConfig {
            simulated_delay_ms: ms,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sets_loading_then_replaces_result() {
        let store = BacktestStore::new(BacktestState::demo(), &config(2000));
        let handle = store.run_backtest("exp-1", "Test");

        let s = store.snapshot();
        assert!(s.is_loading);
        assert_eq!(s.result.as_ref().unwrap().experiment_id, "exp-001");

        handle.await.unwrap();
        let s = store.snapshot();
        assert!(!s.is_loading);
        assert_eq!(s.result.unwrap().experiment_id, "exp-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_result() {
        let store = BacktestStore::demo(&config(10));
        store.clear_result();
        assert!(store.snapshot().result.is_none());
        assert!(store.summary_stats().is_none());
        assert!(store.filtered_trades(TradeFilter::default()).is_empty());
    }

    #[test]
    fn test_demo_report_analytics() {
        let store = BacktestStore::demo(&config(10));
        let stats = store.summary_stats().unwrap();
        assert!(stats.outperformed);
        assert_eq!(store.monthly_returns_for_year(2024).len(), 7);
        assert_eq!(store.filtered_trades(TradeFilter::default()).len(), 156);
    }
}
