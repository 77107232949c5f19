use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{random_between, round_to};
use crate::domain::{
    AgentAction, CandleData, EpisodeAction, EpisodeTrade, LearningCurvePoint, LogLevel,
    TrainingLog,
};

/// Weight kept from the previous sample when smoothing the learning curve
pub const CURVE_SMOOTHING: f64 = 0.9;

const LOG_LEVELS: [LogLevel; 5] = [
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Warn,
    LogLevel::Debug,
];

const LOG_TEMPLATES: [&str; 10] = [
    "Checkpoint saved",
    "Episode complete. Reward: +{reward}",
    "Policy updated. Loss: {loss}",
    "Learning rate adjusted",
    "Best model updated (Sharpe: {sharpe})",
    "Gradient clipping applied",
    "High gradient norm detected",
    "Environment reset",
    "Batch processed",
    "Evaluation complete",
];

fn smooth(prev: f64, fresh: f64) -> f64 {
    prev * CURVE_SMOOTHING + fresh * (1.0 - CURVE_SMOOTHING)
}

/// Generate the next learning-curve sample.
///
/// The fresh sample follows a log-shaped improvement with bounded noise;
/// when `prev` is given every return, loss and entropy value is blended
/// 0.9/0.1 with it. KL divergence is never smoothed.
pub fn generate_learning_curve_point<R: Rng + ?Sized>(
    rng: &mut R,
    step: u64,
    episode: u64,
    prev: Option<&LearningCurvePoint>,
    timestamp: i64,
) -> LearningCurvePoint {
    let improvement = ((episode + 1) as f64).ln() / 200f64.ln();
    let noise = (rng.gen::<f64>() - 0.5) * 200.0;

    let base_return = 1500.0 * improvement;
    let train_return = (base_return + noise).max(0.0);
    let eval_return = (base_return * 0.9 + noise * 0.5).max(0.0);
    let rollout_return = (base_return * 0.85 + noise * 0.8).max(0.0);

    let policy_loss = (0.5 * (1.0 - improvement) + rng.gen::<f64>() * 0.02).max(0.01);
    let value_loss = (1.0 * (1.0 - improvement) + rng.gen::<f64>() * 0.05).max(0.05);
    let entropy = (1.2 * (1.0 - improvement * 0.8) + rng.gen::<f64>() * 0.05).max(0.1);
    let kl_divergence = 0.01 + rng.gen::<f64>() * 0.005;

    let fresh = LearningCurvePoint {
        step,
        episode,
        timestamp,
        train_return,
        eval_return,
        rollout_return,
        policy_loss,
        value_loss,
        entropy,
        kl_divergence,
    };

    match prev {
        Some(p) => LearningCurvePoint {
            train_return: smooth(p.train_return, fresh.train_return),
            eval_return: smooth(p.eval_return, fresh.eval_return),
            rollout_return: smooth(p.rollout_return, fresh.rollout_return),
            policy_loss: smooth(p.policy_loss, fresh.policy_loss),
            value_loss: smooth(p.value_loss, fresh.value_loss),
            entropy: smooth(p.entropy, fresh.entropy),
            ..fresh
        },
        None => fresh,
    }
}

/// Backfilled curve for a job that has already been running: `count`
/// points, one per rollout of `stride` steps, a minute apart, ending at `now_ms`.
pub fn generate_initial_learning_curve<R: Rng + ?Sized>(
    rng: &mut R,
    count: u64,
    stride: u64,
    now_ms: i64,
) -> Vec<LearningCurvePoint> {
    let last = count.saturating_sub(1);
    (0..count)
        .map(|i| {
            let noise = (rng.gen::<f64>() - 0.5) * 200.0;
            let trend = ((i + 1) as f64).ln() * 300.0;
            let i_f = i as f64;
            LearningCurvePoint {
                step: i * stride,
                episode: i,
                timestamp: now_ms - ((last - i) as i64) * 60_000,
                train_return: (trend + noise).max(0.0),
                eval_return: (trend * 0.9 + noise * 0.5).max(0.0),
                rollout_return: (trend * 0.85 + noise * 0.8).max(0.0),
                policy_loss: (0.5 - i_f * 0.004 + rng.gen::<f64>() * 0.02).max(0.01),
                value_loss: (1.0 - i_f * 0.008 + rng.gen::<f64>() * 0.05).max(0.05),
                entropy: (1.2 - i_f * 0.008 + rng.gen::<f64>() * 0.05).max(0.1),
                kl_divergence: 0.01 + rng.gen::<f64>() * 0.005,
            }
        })
        .collect()
}

/// Hourly candles ending at `now_ms`, annotated with a fixed pattern of
/// agent actions and trade entry/exit markers
pub fn generate_initial_candles<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    start_price: f64,
    now_ms: i64,
) -> Vec<CandleData> {
    let mut candles = Vec::with_capacity(count);
    let mut price = start_price;

    for i in 0..count {
        let change = (rng.gen::<f64>() - 0.48) * 100.0;
        let open = price;
        let close = price + change;
        let high = open.max(close) + rng.gen::<f64>() * 50.0;
        let low = open.min(close) - rng.gen::<f64>() * 50.0;
        let volume = 1000.0 + rng.gen::<f64>() * 5000.0;

        let agent_action = if i % 15 == 0 {
            Some(AgentAction::Long)
        } else if i % 23 == 0 {
            Some(AgentAction::Short)
        } else if i % 10 == 0 {
            Some(AgentAction::Flat)
        } else {
            None
        };

        candles.push(CandleData {
            timestamp: now_ms - ((count - i) as i64) * 3_600_000,
            open,
            high,
            low,
            close,
            volume,
            agent_action,
            trade_entry: i % 15 == 0 || i % 23 == 0,
            trade_exit: i % 18 == 0 || i % 27 == 0,
        });
        price = close;
    }

    candles
}

/// A synthetic trainer log line with templated numbers filled in
pub fn generate_training_log<R: Rng + ?Sized>(rng: &mut R) -> TrainingLog {
    let level = *LOG_LEVELS.choose(rng).unwrap_or(&LogLevel::Info);
    let template = LOG_TEMPLATES.choose(rng).copied().unwrap_or("Batch processed");

    let message = template
        .replace("{reward}", &format!("{:.1}", rng.gen::<f64>() * 1000.0 + 500.0))
        .replace("{loss}", &format!("{:.4}", rng.gen::<f64>() * 0.1))
        .replace("{sharpe}", &format!("{:.2}", rng.gen::<f64>() * 2.0 + 0.5));

    TrainingLog {
        id: format!("log-{}", uuid::Uuid::new_v4().simple()),
        timestamp: Utc::now().timestamp_millis(),
        level,
        message,
    }
}

/// A closed trade of the current episode around `base_price`
pub fn generate_episode_trade<R: Rng + ?Sized>(rng: &mut R, id: u64, base_price: f64) -> EpisodeTrade {
    let is_long = rng.gen_bool(0.5);
    let entry_price = base_price + (rng.gen::<f64>() - 0.5) * 1000.0;
    let pnl_percent = (rng.gen::<f64>() - 0.4) * 5.0;
    let exit_price = entry_price * (1.0 + pnl_percent / 100.0);
    let pnl = (exit_price - entry_price) * 0.05 * if is_long { 1.0 } else { -1.0 };
    let duration = random_between(rng, 30.0, 480.0).floor() as u64;

    EpisodeTrade {
        id,
        action: if is_long { EpisodeAction::Buy } else { EpisodeAction::Sell },
        entry_price: round_to(entry_price, 2),
        exit_price: Some(round_to(exit_price, 2)),
        pnl: round_to(pnl, 2),
        duration,
        timestamp: Utc::now().timestamp_millis() - (duration as i64) * 60_000,
    }
}
