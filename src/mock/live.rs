use chrono::{SecondsFormat, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{random_between, round_to};
use crate::domain::{Alert, AlertType, LiveAction, LiveTrade};

fn alert_messages(kind: AlertType) -> &'static [&'static str] {
    match kind {
        AlertType::Info => &[
            "New trade executed",
            "Daily P&L update",
            "Model prediction updated",
            "Nightly retraining scheduled",
        ],
        AlertType::Warning => &[
            "High volatility detected",
            "Approaching daily loss limit",
            "Low confidence prediction",
            "API rate limit warning",
        ],
        AlertType::Success => &[
            "Trade closed with profit",
            "New high equity reached",
            "Model checkpoint saved",
            "Connection restored",
        ],
        AlertType::Error => &[
            "Trade execution failed",
            "API connection lost",
            "Model inference error",
            "Insufficient balance",
        ],
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A fill of the live session near `base_price`; about one in five stays open
pub fn generate_live_trade<R: Rng + ?Sized>(rng: &mut R, base_price: f64) -> LiveTrade {
    let is_long = rng.gen_bool(0.5);
    let price = base_price + (rng.gen::<f64>() - 0.5) * 500.0;
    let size = round_to(random_between(rng, 0.01, 0.1), 3);
    let pnl = (rng.gen::<f64>() - 0.4) * 200.0;

    LiveTrade {
        id: format!("trade-{}", uuid::Uuid::new_v4().simple()),
        timestamp: now_rfc3339(),
        action: if is_long { LiveAction::Buy } else { LiveAction::Sell },
        price: round_to(price, 2),
        size,
        pnl: round_to(pnl, 2),
        is_open: rng.gen::<f64>() > 0.8,
    }
}

/// An unread alert of a random kind
pub fn generate_alert<R: Rng + ?Sized>(rng: &mut R) -> Alert {
    let kind = *AlertType::ALL.choose(rng).unwrap_or(&AlertType::Info);
    let message = alert_messages(kind).choose(rng).copied().unwrap_or_default();

    Alert {
        id: format!("alert-{}", uuid::Uuid::new_v4().simple()),
        timestamp: now_rfc3339(),
        kind,
        message: message.to_string(),
        read: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_live_trade_bounds() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..200 {
            let trade = generate_live_trade(&mut rng, 42000.0);
            assert!((trade.price - 42000.0).abs() <= 250.01);
            assert!(trade.size >= 0.01 && trade.size <= 0.1);
            assert!(trade.pnl >= -80.0 && trade.pnl <= 120.0);
        }
    }

    #[test]
    fn test_alert_message_matches_kind() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..100 {
            let alert = generate_alert(&mut rng);
            assert!(!alert.read);
            assert!(alert_messages(alert.kind).contains(&alert.message.as_str()));
        }
    }

    #[test]
    fn test_alert_ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(8);
        let a = generate_alert(&mut rng);
        let b = generate_alert(&mut rng);
        assert_ne!(a.id, b.id);
    }
}
