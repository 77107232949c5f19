//! Synthetic backtest report
//!
//! Headline metrics and baseline rows are fixed; curves, monthly returns,
//! rolling metrics and the trade list are regenerated on every call.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rand::Rng;

use super::round_to;
use crate::domain::{
    BacktestMetrics, BacktestResult, BaselineComparison, EquityPoint, MonthlyReturn,
    RollingMetric, Trade, TradeAction,
};

pub const BACKTEST_START: (i32, u32, u32) = (2024, 6, 1);
pub const BACKTEST_START_DATE: &str = "2024-06-01";
pub const BACKTEST_END_DATE: &str = "2025-12-19";
pub const BEST_CHECKPOINT_ID: &str = "ckpt-best-sharpe";

const EQUITY_DAYS: i64 = 365;
const ROLLING_DAYS: i64 = 335;
const TRADE_COUNT: u64 = 156;
const STARTING_EQUITY: f64 = 10_000.0;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn midnight_millis(day: NaiveDate) -> i64 {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Daily equity of the model and the buy-and-hold benchmark, one year from the start date
pub fn generate_equity_curve<R: Rng + ?Sized>(rng: &mut R) -> Vec<EquityPoint> {
    let (y, m, d) = BACKTEST_START;
    let start = date(y, m, d);

    let mut equity = STARTING_EQUITY;
    let mut benchmark = STARTING_EQUITY;
    let mut max_equity = equity;

    (0..EQUITY_DAYS)
        .map(|i| {
            let day = start + Duration::days(i);

            let daily_return = (rng.gen::<f64>() - 0.45) * 0.03;
            equity *= 1.0 + daily_return;
            max_equity = max_equity.max(equity);
            let drawdown = equity - max_equity;
            let drawdown_percent = drawdown / max_equity * 100.0;

            let benchmark_return = (rng.gen::<f64>() - 0.48) * 0.025;
            benchmark *= 1.0 + benchmark_return;

            EquityPoint {
                timestamp: midnight_millis(day),
                date: day.format("%Y-%m-%d").to_string(),
                equity: round_to(equity, 2),
                benchmark: round_to(benchmark, 2),
                drawdown: round_to(drawdown, 2),
                drawdown_percent: round_to(drawdown_percent, 2),
            }
        })
        .collect()
}

/// One return per month from June 2024 through December 2025
pub fn generate_monthly_returns<R: Rng + ?Sized>(rng: &mut R) -> Vec<MonthlyReturn> {
    let mut returns = Vec::with_capacity(19);
    for year in 2024..=2025 {
        let start_month = if year == 2024 { 6 } else { 1 };
        for month in start_month..=12 {
            returns.push(MonthlyReturn {
                year,
                month,
                return_pct: round_to((rng.gen::<f64>() - 0.35) * 15.0, 2),
            });
        }
    }
    returns
}

/// Closed trades spaced one to three days apart, roughly 62% winners
pub fn generate_backtest_trades<R: Rng + ?Sized>(rng: &mut R) -> Vec<Trade> {
    let (y, m, d) = BACKTEST_START;
    let mut current = midnight_millis(date(y, m, d));
    let mut trades = Vec::with_capacity(TRADE_COUNT as usize);

    for id in 1..=TRADE_COUNT {
        let days = rng.gen_range(1..=3i64);
        current += days * 86_400_000;

        let entry_price = 40_000.0 + rng.gen::<f64>() * 5_000.0;
        let is_win = rng.gen::<f64>() > 0.38;
        let pnl_percent = if is_win {
            rng.gen::<f64>() * 3.0 + 0.5
        } else {
            -(rng.gen::<f64>() * 2.0 + 0.3)
        };
        let exit_price = entry_price * (1.0 + pnl_percent / 100.0);
        let size = rng.gen::<f64>() * 0.1 + 0.01;
        let duration = (rng.gen::<f64>() * 1440.0).floor() as u64 + 30;
        let pnl = size * (exit_price - entry_price);
        let fees = size * entry_price * 0.001;
        let action = if rng.gen_bool(0.5) {
            TradeAction::Buy
        } else {
            TradeAction::Short
        };

        trades.push(Trade {
            id,
            entry_time: rfc3339_millis(current),
            exit_time: rfc3339_millis(current + duration as i64 * 60_000),
            action,
            entry_price: round_to(entry_price, 2),
            exit_price: round_to(exit_price, 2),
            size: round_to(size, 4),
            duration,
            pnl: round_to(pnl, 2),
            pnl_percent: round_to(pnl_percent, 2),
            fees: round_to(fees, 2),
        });
    }

    trades
}

/// Rolling Sharpe and max drawdown on a slow sine with noise
pub fn generate_rolling_metrics<R: Rng + ?Sized>(rng: &mut R) -> Vec<RollingMetric> {
    let start = date(2024, 7, 1);

    (0..ROLLING_DAYS)
        .map(|i| {
            let day = start + Duration::days(i);
            let x = i as f64;
            RollingMetric {
                timestamp: midnight_millis(day),
                date: day.format("%Y-%m-%d").to_string(),
                sharpe: 1.5 + (x / 30.0).sin() * 0.5 + (rng.gen::<f64>() - 0.5) * 0.3,
                max_drawdown: -(5.0 + (x / 20.0).sin().abs() * 8.0 + rng.gen::<f64>() * 3.0),
            }
        })
        .collect()
}

pub fn model_metrics() -> BacktestMetrics {
    BacktestMetrics {
        total_return: 4520.0,
        total_return_percent: 45.2,
        annual_return: 28.3,
        win_rate: 62.5,
        sharpe_ratio: 1.87,
        sortino_ratio: 2.34,
        max_drawdown: -1230.0,
        max_drawdown_percent: -12.3,
        calmar_ratio: 2.30,
        profit_factor: 1.95,
        total_trades: 156,
        winning_trades: 98,
        losing_trades: 58,
        avg_win: 85.3,
        avg_loss: -42.1,
        best_trade: 485.0,
        worst_trade: -215.0,
        avg_hold_time: 180.0,
    }
}

/// Buy-and-hold over the same window: one trade held for a year
pub fn benchmark_metrics() -> BacktestMetrics {
    BacktestMetrics {
        total_return: 3800.0,
        total_return_percent: 38.0,
        annual_return: 24.1,
        win_rate: 52.0,
        sharpe_ratio: 1.23,
        sortino_ratio: 1.56,
        max_drawdown: -1850.0,
        max_drawdown_percent: -18.5,
        calmar_ratio: 1.30,
        profit_factor: 1.45,
        total_trades: 1,
        winning_trades: 1,
        losing_trades: 0,
        avg_win: 3800.0,
        avg_loss: 0.0,
        best_trade: 3800.0,
        worst_trade: 0.0,
        avg_hold_time: 525_600.0,
    }
}

pub fn baseline_comparisons() -> Vec<BaselineComparison> {
    let row = |name: &str, return_pct: f64, sharpe: f64, max_drawdown: f64| BaselineComparison {
        name: name.to_string(),
        return_pct,
        sharpe,
        max_drawdown,
        notes: String::new(),
        is_best: false,
        is_worst: false,
    };

    vec![
        BaselineComparison {
            notes: "BEST".to_string(),
            is_best: true,
            ..row("RL Model (ours)", 45.2, 1.87, -12.3)
        },
        row("Buy & Hold", 38.0, 1.23, -18.5),
        row("MA Crossover (12/26)", 22.1, 0.85, -15.2),
        BaselineComparison {
            notes: "WORST".to_string(),
            is_worst: true,
            ..row("Random Trading", -2.3, -0.12, -45.0)
        },
    ]
}

/// Full report for `experiment_id`, stamped `bt-<millis of run_at>`
pub fn generate_backtest_result<R: Rng + ?Sized>(
    rng: &mut R,
    experiment_id: &str,
    experiment_name: &str,
    run_at: DateTime<Utc>,
) -> BacktestResult {
    BacktestResult {
        id: format!("bt-{}", run_at.timestamp_millis()),
        experiment_id: experiment_id.to_string(),
        experiment_name: experiment_name.to_string(),
        checkpoint_id: BEST_CHECKPOINT_ID.to_string(),
        start_date: BACKTEST_START_DATE.to_string(),
        end_date: BACKTEST_END_DATE.to_string(),
        run_at: run_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        metrics: model_metrics(),
        benchmark_metrics: benchmark_metrics(),
        equity_curve: generate_equity_curve(rng),
        monthly_returns: generate_monthly_returns(rng),
        rolling_metrics: generate_rolling_metrics(rng),
        trades: generate_backtest_trades(rng),
        baseline_comparisons: baseline_comparisons(),
    }
}

fn rfc3339_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_equity_curve_drawdown_never_positive() {
        let mut rng = StdRng::seed_from_u64(42);
        let curve = generate_equity_curve(&mut rng);
        assert_eq!(curve.len(), 365);
        assert_eq!(curve[0].date, "2024-06-01");
        assert_eq!(curve[364].date, "2025-05-31");
        assert!(curve.iter().all(|p| p.drawdown <= 0.0 && p.drawdown_percent <= 0.0));
    }

    #[test]
    fn test_monthly_returns_span() {
        let mut rng = StdRng::seed_from_u64(1);
        let returns = generate_monthly_returns(&mut rng);
        assert_eq!(returns.len(), 19);
        assert_eq!((returns[0].year, returns[0].month), (2024, 6));
        assert_eq!((returns[18].year, returns[18].month), (2025, 12));
    }

    #[test]
    fn test_trades_are_ordered_and_sized() {
        let mut rng = StdRng::seed_from_u64(9);
        let trades = generate_backtest_trades(&mut rng);
        assert_eq!(trades.len(), 156);
        assert!(trades.windows(2).all(|w| w[0].entry_time < w[1].entry_time));
        for t in &trades {
            assert!(t.size >= 0.01 && t.size <= 0.11);
            assert!(t.duration >= 30 && t.duration < 1470);
            assert!(matches!(t.action, TradeAction::Buy | TradeAction::Short));
            assert_eq!(t.pnl_percent > 0.0, t.exit_price > t.entry_price);
        }
    }

    #[test]
    fn test_baselines_flag_best_and_worst() {
        let rows = baseline_comparisons();
        assert_eq!(rows.iter().filter(|r| r.is_best).count(), 1);
        assert_eq!(rows.iter().filter(|r| r.is_worst).count(), 1);
        assert_eq!(rows[0].name, "RL Model (ours)");
    }

    #[test]
    fn test_result_id_and_dates() {
        let mut rng = StdRng::seed_from_u64(0);
        let run_at = DateTime::<Utc>::from_timestamp_millis(1_734_566_400_000).unwrap();
        let result = generate_backtest_result(&mut rng, "exp-002", "DQN_ETH", run_at);
        assert_eq!(result.id, "bt-1734566400000");
        assert_eq!(result.experiment_id, "exp-002");
        assert_eq!(result.start_date, BACKTEST_START_DATE);
        assert_eq!(result.rolling_metrics.len(), 335);
    }
}
