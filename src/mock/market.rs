use rand::Rng;

use super::{random_between, round_to};
use crate::domain::CandleData;

/// Default per-candle volatility (0.2%)
pub const CANDLE_VOLATILITY: f64 = 0.002;

/// Generate one OHLCV candle opening at `prev_close`.
///
/// The drift is slightly upward (the uniform draw is centered at 0.48).
/// High and low are pushed outward from the body, so the candle is always
/// well formed, and rounding to cents keeps that ordering.
pub fn generate_candle<R: Rng + ?Sized>(
    rng: &mut R,
    prev_close: f64,
    timestamp: i64,
    volatility: f64,
) -> CandleData {
    let change = (rng.gen::<f64>() - 0.48) * prev_close * volatility * 2.0;
    let open = prev_close;
    let close = prev_close + change;
    let high = open.max(close) + rng.gen::<f64>() * prev_close * volatility;
    let low = open.min(close) - rng.gen::<f64>() * prev_close * volatility;
    let volume = random_between(rng, 100.0, 5000.0);

    CandleData {
        timestamp,
        open: round_to(open, 2),
        high: round_to(high, 2),
        low: round_to(low, 2),
        close: round_to(close, 2),
        volume: volume.round(),
        agent_action: None,
        trade_entry: false,
        trade_exit: false,
    }
}

/// Generate `count` chained candles, each opening at the previous close
pub fn generate_candle_series<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    start_price: f64,
    start_time: i64,
    interval_ms: i64,
) -> Vec<CandleData> {
    let mut candles = Vec::with_capacity(count);
    let mut price = start_price;
    let mut time = start_time;

    for _ in 0..count {
        let candle = generate_candle(rng, price, time, CANDLE_VOLATILITY);
        price = candle.close;
        time += interval_ms;
        candles.push(candle);
    }

    candles
}

/// One random-walk tick: `price * (1 + uniform(-volatility, +volatility))`, rounded to cents
pub fn next_price<R: Rng + ?Sized>(rng: &mut R, current: f64, volatility: f64) -> f64 {
    let change = (rng.gen::<f64>() - 0.5) * current * volatility * 2.0;
    round_to(current + change, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_candles_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut price = 42000.0;
        for i in 0..1000 {
            let candle = generate_candle(&mut rng, price, i, CANDLE_VOLATILITY);
            assert!(candle.is_well_formed(), "malformed candle: {:?}", candle);
            assert!(candle.volume >= 100.0 && candle.volume <= 5000.0);
            price = candle.close;
        }
    }

    #[test]
    fn test_series_chains_closes() {
        let mut rng = StdRng::seed_from_u64(11);
        let series = generate_candle_series(&mut rng, 50, 42000.0, 0, 3_600_000);
        assert_eq!(series.len(), 50);
        assert_eq!(series[0].open, 42000.0);
        for pair in series.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
            assert_eq!(pair[1].timestamp - pair[0].timestamp, 3_600_000);
        }
    }

    #[test]
    fn test_next_price_stays_within_band() {
        let mut rng = StdRng::seed_from_u64(3);
        let volatility = 0.0002;
        let mut price = 42520.0;
        for _ in 0..500 {
            let next = next_price(&mut rng, price, volatility);
            // Band plus half a cent of rounding
            assert!((next - price).abs() <= price * volatility + 0.005);
            price = next;
        }
    }
}
