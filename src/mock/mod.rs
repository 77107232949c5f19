//! Randomized generators for synthetic dashboard data
//!
//! All generators take the RNG explicitly so callers can seed them.
//! Nothing here is stateful.

pub mod backtest;
pub mod live;
pub mod market;
pub mod training;

pub use backtest::{
    generate_backtest_result, generate_backtest_trades, generate_equity_curve,
    generate_monthly_returns, generate_rolling_metrics,
};
pub use live::{generate_alert, generate_live_trade};
pub use market::{generate_candle, generate_candle_series, next_price};
pub use training::{
    generate_episode_trade, generate_initial_candles, generate_initial_learning_curve,
    generate_learning_curve_point, generate_training_log,
};

/// Round to `decimals` places the way the dashboard displays values
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Uniform sample in `[min, max)`
pub(crate) fn random_between<R: rand::Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    rng.gen::<f64>() * (max - min) + min
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(42.4567, 2), 42.46);
        assert_eq!(round_to(45.04, 1), 45.0);
        assert_eq!(round_to(-1.005, 0), -1.0);
    }
}
