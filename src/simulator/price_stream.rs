//! Simulated market-data feed
//!
//! Random-walk price ticks on a fixed cadence. Change figures are measured
//! against the baseline captured when the stream was created, not against
//! the previous tick.

use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use super::ticker::{TickControl, Ticker};
use crate::config::PriceStreamConfig;
use crate::domain::RingBuffer;
use crate::mock::{next_price, round_to};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    /// Unix millis
    pub timestamp: i64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStreamState {
    pub is_connected: bool,
    pub current_price: f64,
    pub base_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    /// Oldest first
    pub price_history: RingBuffer<PricePoint>,
}

impl PriceStreamState {
    pub fn new(initial_price: f64, history_capacity: usize, now_ms: i64) -> Self {
        let mut price_history = RingBuffer::new(history_capacity);
        price_history.push_back(PricePoint {
            timestamp: now_ms,
            price: initial_price,
        });

        Self {
            is_connected: true,
            current_price: initial_price,
            base_price: initial_price,
            price_change: 0.0,
            price_change_percent: 0.0,
            price_history,
        }
    }
}

pub struct PriceStream {
    state: Store<PriceStreamState>,
    config: PriceStreamConfig,
    ticker: Ticker,
}

impl PriceStream {
    pub fn new(config: PriceStreamConfig) -> Self {
        let state = PriceStreamState::new(
            config.initial_price,
            config.history_capacity,
            Utc::now().timestamp_millis(),
        );
        Self {
            state: Store::new(state),
            config,
            ticker: Ticker::new("price-stream"),
        }
    }

    pub fn store(&self) -> &Store<PriceStreamState> {
        &self.state
    }

    pub fn snapshot(&self) -> PriceStreamState {
        self.state.get()
    }

    pub fn current_price(&self) -> f64 {
        self.state.read(|s| s.current_price)
    }

    /// Mark the feed connected and (re)start ticking; history is kept
    pub fn connect(&self) {
        self.state.update(|s| s.is_connected = true);

        let state = self.state.clone();
        let volatility = self.config.volatility;
        let mut rng = StdRng::from_entropy();
        if self.ticker.start(
            Duration::from_millis(self.config.tick_interval_ms),
            move || {
                apply_tick(&state, volatility, &mut rng, Utc::now().timestamp_millis());
                TickControl::Continue
            },
        ) {
            info!(
                initial_price = self.config.initial_price,
                interval_ms = self.config.tick_interval_ms,
                "Price stream connected"
            );
        }
    }

    /// Stop ticking and mark the feed disconnected
    pub fn disconnect(&self) {
        self.ticker.stop();
        self.state.update(|s| s.is_connected = false);
        info!("Price stream disconnected");
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Run one tick synchronously; ignored while disconnected
    pub fn tick_with<R: Rng + ?Sized>(&self, rng: &mut R, now_ms: i64) -> bool {
        apply_tick(&self.state, self.config.volatility, rng, now_ms)
    }
}

fn apply_tick<R: Rng + ?Sized>(
    state: &Store<PriceStreamState>,
    volatility: f64,
    rng: &mut R,
    now_ms: i64,
) -> bool {
    if !state.read(|s| s.is_connected) {
        return false;
    }

    state.update(|s| {
        let price = next_price(rng, s.current_price, volatility);
        let change = price - s.base_price;
        let change_percent = if s.base_price != 0.0 {
            change / s.base_price * 100.0
        } else {
            0.0
        };

        s.current_price = price;
        s.price_change = round_to(change, 2);
        s.price_change_percent = round_to(change_percent, 2);
        s.price_history.push_back(PricePoint {
            timestamp: now_ms,
            price,
        });
        debug!(price, change = s.price_change, "Price tick");
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(capacity: usize) -> PriceStream {
        PriceStream::new(PriceStreamConfig {
            history_capacity: capacity,
            ..PriceStreamConfig::default()
        })
    }

    #[test]
    fn test_history_keeps_most_recent() {
        let stream = stream(10);
        let mut rng = StdRng::seed_from_u64(1);
        for i in 1..=25 {
            assert!(stream.tick_with(&mut rng, i));
        }

        let s = stream.snapshot();
        assert_eq!(s.price_history.len(), 10);
        let stamps: Vec<i64> = s.price_history.iter().map(|p| p.timestamp).collect();
        assert_eq!(stamps, (16..=25).collect::<Vec<_>>());
        assert_eq!(s.price_history.back().unwrap().price, s.current_price);
    }

    #[test]
    fn test_change_is_against_baseline() {
        let stream = stream(100);
        let mut rng = StdRng::seed_from_u64(2);
        for i in 0..50 {
            stream.tick_with(&mut rng, i);
        }
        let s = stream.snapshot();
        assert_eq!(s.base_price, 42520.0);
        assert!((s.price_change - round_to(s.current_price - 42520.0, 2)).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_halts_and_reconnect_keeps_history() {
        let stream = stream(100);
        stream.connect();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        let before = stream.snapshot().price_history.len();
        assert_eq!(before, 4);

        stream.disconnect();
        assert!(!stream.tick_with(&mut StdRng::seed_from_u64(3), 0));
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(stream.snapshot().price_history.len(), before);

        stream.connect();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(stream.snapshot().price_history.len(), before + 2);
        assert!(stream.snapshot().is_connected);
    }
}
