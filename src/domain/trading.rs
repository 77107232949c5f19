//! Backtest report and live-session records

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Short,
    Cover,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::Short => "SHORT",
            TradeAction::Cover => "COVER",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A closed backtest trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: u64,
    /// RFC 3339
    pub entry_time: String,
    pub exit_time: String,
    pub action: TradeAction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    /// Minutes
    pub duration: u64,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub fees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestMetrics {
    pub total_return: f64,
    pub total_return_percent: f64,
    pub annual_return: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
    pub calmar_ratio: f64,
    pub profit_factor: f64,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    /// Minutes
    pub avg_hold_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub timestamp: i64,
    /// YYYY-MM-DD
    pub date: String,
    pub equity: f64,
    pub benchmark: f64,
    pub drawdown: f64,
    pub drawdown_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    /// 1-12
    pub month: u32,
    #[serde(rename = "return")]
    pub return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingMetric {
    pub timestamp: i64,
    pub date: String,
    pub sharpe: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineComparison {
    pub name: String,
    #[serde(rename = "return")]
    pub return_pct: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub notes: String,
    #[serde(default)]
    pub is_best: bool,
    #[serde(default)]
    pub is_worst: bool,
}

/// Complete backtest report, replaced wholesale on every run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub id: String,
    pub experiment_id: String,
    pub experiment_name: String,
    pub checkpoint_id: String,
    pub start_date: String,
    pub end_date: String,
    pub run_at: String,
    pub metrics: BacktestMetrics,
    pub benchmark_metrics: BacktestMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub rolling_metrics: Vec<RollingMetric>,
    pub trades: Vec<Trade>,
    pub baseline_comparisons: Vec<BaselineComparison>,
}

/// Trade list filter; `None` fields do not filter
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeFilter {
    pub action: Option<TradeAction>,
    /// `Some(true)` keeps winners, `Some(false)` keeps losers; break-even trades match neither
    pub pnl_positive: Option<bool>,
}

/// Headline comparison of the model against its benchmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub return_vs_benchmark: f64,
    pub sharpe_vs_benchmark: f64,
    pub drawdown_improvement: f64,
    pub outperformed: bool,
}

impl BacktestResult {
    pub fn filtered_trades(&self, filter: TradeFilter) -> Vec<&Trade> {
        self.trades
            .iter()
            .filter(|t| filter.action.map_or(true, |a| t.action == a))
            .filter(|t| match filter.pnl_positive {
                Some(true) => t.pnl > 0.0,
                Some(false) => t.pnl < 0.0,
                None => true,
            })
            .collect()
    }

    pub fn monthly_returns_for_year(&self, year: i32) -> Vec<&MonthlyReturn> {
        self.monthly_returns.iter().filter(|r| r.year == year).collect()
    }

    pub fn summary_stats(&self) -> SummaryStats {
        let m = &self.metrics;
        let b = &self.benchmark_metrics;
        SummaryStats {
            return_vs_benchmark: m.total_return_percent - b.total_return_percent,
            sharpe_vs_benchmark: m.sharpe_ratio - b.sharpe_ratio,
            drawdown_improvement: b.max_drawdown_percent - m.max_drawdown_percent,
            outperformed: m.total_return_percent > b.total_return_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Info,
    Warning,
    Success,
    Error,
}

impl AlertType {
    pub const ALL: [AlertType; 4] = [
        AlertType::Info,
        AlertType::Warning,
        AlertType::Success,
        AlertType::Error,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub message: String,
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LiveAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTrade {
    pub id: String,
    pub timestamp: String,
    pub action: LiveAction,
    pub price: f64,
    pub size: f64,
    pub pnl: f64,
    pub is_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

impl PositionSide {
    fn sign(&self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
            PositionSide::Flat => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub size: f64,
    pub entry_price: f64,
    pub current_price: f64,
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: f64,
    #[serde(rename = "unrealizedPnLPercent")]
    pub unrealized_pnl_percent: f64,
}

impl Position {
    pub fn mark_to_market(&mut self, price: f64) {
        let sign = self.side.sign();
        self.current_price = price;
        self.unrealized_pnl = (price - self.entry_price) * self.size * sign;
        self.unrealized_pnl_percent = if self.entry_price > 0.0 {
            (price - self.entry_price) / self.entry_price * 100.0 * sign
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(id: u64, action: TradeAction, pnl: f64) -> Trade {
        Trade {
            id,
            entry_time: "2024-06-02T00:00:00Z".to_string(),
            exit_time: "2024-06-02T03:00:00Z".to_string(),
            action,
            entry_price: 42000.0,
            exit_price: 42100.0,
            size: 0.05,
            duration: 180,
            pnl,
            pnl_percent: 0.24,
            fees: 2.1,
        }
    }

    fn metrics(total_return_percent: f64, sharpe: f64, max_dd_pct: f64) -> BacktestMetrics {
        BacktestMetrics {
            total_return: 0.0,
            total_return_percent,
            annual_return: 0.0,
            win_rate: 0.0,
            sharpe_ratio: sharpe,
            sortino_ratio: 0.0,
            max_drawdown: 0.0,
            max_drawdown_percent: max_dd_pct,
            calmar_ratio: 0.0,
            profit_factor: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            avg_win: 0.0,
            avg_loss: 0.0,
            best_trade: 0.0,
            worst_trade: 0.0,
            avg_hold_time: 0.0,
        }
    }

    fn result() -> BacktestResult {
        BacktestResult {
            id: "bt-1".to_string(),
            experiment_id: "exp-1".to_string(),
            experiment_name: "Test".to_string(),
            checkpoint_id: "ckpt".to_string(),
            start_date: "2024-06-01".to_string(),
            end_date: "2025-12-19".to_string(),
            run_at: "2025-12-19T00:00:00Z".to_string(),
            metrics: metrics(45.2, 1.87, -12.3),
            benchmark_metrics: metrics(38.0, 1.23, -18.5),
            equity_curve: Vec::new(),
            monthly_returns: vec![
                MonthlyReturn { year: 2024, month: 11, return_pct: 1.0 },
                MonthlyReturn { year: 2025, month: 1, return_pct: -2.0 },
            ],
            rolling_metrics: Vec::new(),
            trades: vec![
                trade(1, TradeAction::Buy, 10.0),
                trade(2, TradeAction::Short, -4.0),
                trade(3, TradeAction::Buy, -1.0),
                trade(4, TradeAction::Buy, 0.0),
            ],
            baseline_comparisons: Vec::new(),
        }
    }

    #[test]
    fn test_filtered_trades() {
        let r = result();
        assert_eq!(r.filtered_trades(TradeFilter::default()).len(), 4);

        let buys = r.filtered_trades(TradeFilter {
            action: Some(TradeAction::Buy),
            pnl_positive: None,
        });
        assert_eq!(buys.len(), 3);

        let losing_buys = r.filtered_trades(TradeFilter {
            action: Some(TradeAction::Buy),
            pnl_positive: Some(false),
        });
        assert_eq!(losing_buys.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_summary_stats() {
        let stats = result().summary_stats();
        assert!((stats.return_vs_benchmark - 7.2).abs() < 1e-9);
        assert!((stats.drawdown_improvement - (-6.2)).abs() < 1e-9);
        assert!(stats.outperformed);
    }

    #[test]
    fn test_monthly_returns_for_year() {
        let r = result();
        assert_eq!(r.monthly_returns_for_year(2025).len(), 1);
        assert!(r.monthly_returns_for_year(2023).is_empty());
    }

    #[test]
    fn test_position_mark_to_market() {
        let mut position = Position {
            symbol: "BTCUSDT".to_string(),
            side: PositionSide::Long,
            size: 0.05,
            entry_price: 42300.0,
            current_price: 42300.0,
            unrealized_pnl: 0.0,
            unrealized_pnl_percent: 0.0,
        };
        position.mark_to_market(42500.0);
        assert!((position.unrealized_pnl - 10.0).abs() < 1e-9);
        assert!(position.unrealized_pnl_percent > 0.0);
    }
}
