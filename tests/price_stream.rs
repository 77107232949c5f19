use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rlboard::config::{LiveFeedConfig, PriceStreamConfig};
use rlboard::simulator::{LiveFeed, PriceStream, SessionStatus};

#[test]
fn history_holds_most_recent_capacity_entries() {
    let stream = PriceStream::new(PriceStreamConfig::default());
    let mut rng = StdRng::seed_from_u64(21);
    for ts in 1..=130 {
        stream.tick_with(&mut rng, ts);
    }

    let s = stream.snapshot();
    assert_eq!(s.price_history.len(), 100);
    let stamps: Vec<i64> = s.price_history.iter().map(|p| p.timestamp).collect();
    assert_eq!(stamps.first(), Some(&31));
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test(start_paused = true)]
async fn live_position_follows_stream_ticks() {
    let stream = PriceStream::new(PriceStreamConfig::default());
    let feed = LiveFeed::new(LiveFeedConfig::default(), stream.store().clone());
    stream.connect();
    feed.connect();

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    let price = stream.current_price();
    let s = feed.snapshot();
    assert_eq!(s.status, SessionStatus::Connected);
    assert_eq!(s.position.current_price, price);
    assert!((s.position.unrealized_pnl - (price - 42300.0) * 0.05).abs() < 1e-6);

    feed.pause();
    stream.disconnect();
    assert!(!stream.is_ticking());
    assert!(!feed.is_ticking());
}
