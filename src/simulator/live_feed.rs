//! Simulated live trading session
//!
//! Alerts and fills arrive at random on a slow cadence while the session is
//! connected. The open position is marked to market on every price stream
//! update.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use super::price_stream::PriceStreamState;
use super::ticker::{TickControl, Ticker};
use crate::config::LiveFeedConfig;
use crate::domain::{Alert, LiveTrade, Position, PositionSide, RingBuffer};
use crate::mock::{generate_alert, generate_live_trade};
use crate::store::{Store, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Connected,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionState {
    pub status: SessionStatus,
    /// Newest first
    pub alerts: RingBuffer<Alert>,
    /// Newest first
    pub recent_trades: RingBuffer<LiveTrade>,
    pub position: Position,
}

impl LiveSessionState {
    pub fn new(config: &LiveFeedConfig, position: Position) -> Self {
        Self {
            status: SessionStatus::Connected,
            alerts: RingBuffer::new(config.alert_capacity),
            recent_trades: RingBuffer::new(config.trade_capacity),
            position,
        }
    }
}

/// The session's starting position
pub fn demo_position() -> Position {
    let mut position = Position {
        symbol: "BTCUSDT".to_string(),
        side: PositionSide::Long,
        size: 0.05,
        entry_price: 42300.0,
        current_price: 42300.0,
        unrealized_pnl: 0.0,
        unrealized_pnl_percent: 0.0,
    };
    position.mark_to_market(42520.0);
    position
}

pub struct LiveFeed {
    state: Store<LiveSessionState>,
    prices: Store<PriceStreamState>,
    config: LiveFeedConfig,
    ticker: Ticker,
    price_subscription: Mutex<Option<Subscription>>,
}

impl LiveFeed {
    pub fn new(config: LiveFeedConfig, prices: Store<PriceStreamState>) -> Self {
        let mut position = demo_position();
        position.mark_to_market(prices.read(|p| p.current_price));

        Self {
            state: Store::new(LiveSessionState::new(&config, position)),
            prices,
            config,
            ticker: Ticker::new("live-feed"),
            price_subscription: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Store<LiveSessionState> {
        &self.state
    }

    pub fn snapshot(&self) -> LiveSessionState {
        self.state.get()
    }

    /// Follow the price stream and start the alert/trade timer
    pub fn connect(&self) {
        self.state.update(|s| s.status = SessionStatus::Connected);

        {
            let mut slot = self
                .price_subscription
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                let state = self.state.clone();
                *slot = Some(self.prices.subscribe(move |p: &PriceStreamState| {
                    let price = p.current_price;
                    state.update(|s| s.position.mark_to_market(price));
                }));
            }
        }

        let state = self.state.clone();
        let prices = self.prices.clone();
        let config = self.config.clone();
        let mut rng = StdRng::from_entropy();
        if self.ticker.start(
            Duration::from_millis(self.config.tick_interval_ms),
            move || {
                apply_tick(&state, &prices, &config, &mut rng);
                TickControl::Continue
            },
        ) {
            info!(interval_ms = self.config.tick_interval_ms, "Live session connected");
        }
    }

    /// Stop the timer; the position keeps tracking prices
    pub fn pause(&self) {
        self.ticker.stop();
        self.state.update(|s| s.status = SessionStatus::Paused);
        info!("Live session paused");
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn tick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        apply_tick(&self.state, &self.prices, &self.config, rng)
    }

    pub fn mark_alert_read(&self, id: &str) -> bool {
        let mut found = false;
        self.state.update(|s| {
            let mut alerts: Vec<Alert> = s.alerts.to_vec();
            if let Some(alert) = alerts.iter_mut().find(|a| a.id == id) {
                alert.read = true;
                found = true;
                s.alerts = RingBuffer::from_iter_back(s.alerts.capacity(), alerts);
            }
        });
        found
    }

    pub fn unread_alerts(&self) -> usize {
        self.state.read(|s| s.alerts.iter().filter(|a| !a.read).count())
    }
}

/// Returns whether anything was added
fn apply_tick<R: Rng + ?Sized>(
    state: &Store<LiveSessionState>,
    prices: &Store<PriceStreamState>,
    config: &LiveFeedConfig,
    rng: &mut R,
) -> bool {
    if state.read(|s| s.status) != SessionStatus::Connected {
        return false;
    }

    let alert = rng
        .gen_bool(config.alert_probability.clamp(0.0, 1.0))
        .then(|| generate_alert(rng));
    let price = prices.read(|p| p.current_price);
    let trade = rng
        .gen_bool(config.trade_probability.clamp(0.0, 1.0))
        .then(|| generate_live_trade(rng, price));

    if alert.is_none() && trade.is_none() {
        return false;
    }

    debug!(alert = alert.is_some(), trade = trade.is_some(), price, "Live tick");
    state.update(|s| {
        if let Some(alert) = alert {
            s.alerts.push_front(alert);
        }
        if let Some(trade) = trade {
            s.recent_trades.push_front(trade);
        }
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> Store<PriceStreamState> {
        Store::new(PriceStreamState::new(42520.0, 100, 0))
    }

    fn always() -> LiveFeedConfig {
        LiveFeedConfig {
            alert_probability: 1.0,
            trade_probability: 1.0,
            ..LiveFeedConfig::default()
        }
    }

    #[test]
    fn test_demo_position() {
        let p = demo_position();
        assert!((p.unrealized_pnl - 11.0).abs() < 1e-9);
        assert!((p.unrealized_pnl_percent - 0.52).abs() < 0.01);
    }

    #[test]
    fn test_buffers_are_newest_first_and_bounded() {
        let feed = LiveFeed::new(always(), prices());
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..30 {
            assert!(feed.tick_with(&mut rng));
        }
        let newest = feed.snapshot().alerts.front().unwrap().id.clone();
        assert!(feed.tick_with(&mut rng));

        let s = feed.snapshot();
        assert_eq!(s.alerts.len(), 20);
        assert_eq!(s.recent_trades.len(), 24);
        assert_eq!(s.alerts.get(1).unwrap().id, newest);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_tracks_price_stream() {
        let prices = prices();
        let feed = LiveFeed::new(LiveFeedConfig::default(), prices.clone());
        feed.connect();

        prices.update(|p| p.current_price = 42000.0);
        let position = feed.snapshot().position;
        assert_eq!(position.current_price, 42000.0);
        assert!((position.unrealized_pnl - (-15.0)).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_session_adds_nothing() {
        let feed = LiveFeed::new(always(), prices());
        feed.connect();
        feed.pause();
        assert!(!feed.is_ticking());
        assert!(!feed.tick_with(&mut StdRng::seed_from_u64(8)));

        tokio::time::sleep(Duration::from_secs(60)).await;
        let s = feed.snapshot();
        assert_eq!(s.status, SessionStatus::Paused);
        assert!(s.alerts.is_empty());
    }

    #[test]
    fn test_mark_alert_read() {
        let feed = LiveFeed::new(always(), prices());
        let mut rng = StdRng::seed_from_u64(9);
        feed.tick_with(&mut rng);
        feed.tick_with(&mut rng);
        let id = feed.snapshot().alerts.front().unwrap().id.clone();

        assert!(feed.mark_alert_read(&id));
        assert!(!feed.mark_alert_read("alert-missing"));
        assert_eq!(feed.unread_alerts(), 1);
    }
}
