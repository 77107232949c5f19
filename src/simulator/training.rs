//! Training data simulator
//!
//! Emulates a running RL job by advancing the step counter on a fixed
//! cadence and feeding derived samples into the training store. It holds
//! no job state of its own; everything lives in the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::ticker::{TickControl, Ticker};
use crate::config::TrainingSimConfig;
use crate::domain::{AgentAction, TrainingState, TrainingStatus};
use crate::mock::market::CANDLE_VOLATILITY;
use crate::mock::{generate_candle, generate_learning_curve_point, generate_training_log, round_to};
use crate::store::{Subscription, TrainingStore};

pub struct TrainingSimulator {
    store: TrainingStore,
    config: TrainingSimConfig,
    ticker: Arc<Ticker>,
    status_subscription: Mutex<Option<Subscription>>,
}

impl TrainingSimulator {
    pub fn new(store: TrainingStore, config: TrainingSimConfig) -> Self {
        Self {
            store,
            config,
            ticker: Arc::new(Ticker::new("training")),
            status_subscription: Mutex::new(None),
        }
    }

    /// With `auto_start` set, follow the job status and start ticking on
    /// every transition into `Running`, including right now.
    ///
    /// Returns whether the timer is running afterwards.
    pub fn attach(&self) -> bool {
        if !self.config.auto_start {
            return false;
        }

        {
            let mut slot = self
                .status_subscription
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                let was_running = AtomicBool::new(self.store.status() == TrainingStatus::Running);
                let ticker = Arc::clone(&self.ticker);
                let store = self.store.clone();
                let config = self.config.clone();
                *slot = Some(self.store.subscribe(move |s: &TrainingState| {
                    let running = s.status == TrainingStatus::Running;
                    if running && !was_running.swap(running, Ordering::SeqCst) {
                        if spawn_ticks(&ticker, &store, &config) {
                            info!(experiment_id = %s.experiment_id, "Training simulator re-armed");
                        }
                    } else {
                        was_running.store(running, Ordering::SeqCst);
                    }
                }));
            }
        }

        if self.store.status() == TrainingStatus::Running {
            self.start();
        }
        self.is_running()
    }

    /// Stop following the job status and halt the timer
    pub fn detach(&self) {
        if let Some(subscription) = self
            .status_subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            subscription.unsubscribe();
        }
        self.stop();
    }

    /// Start the tick timer; a second call while running does nothing
    pub fn start(&self) -> bool {
        let started = spawn_ticks(&self.ticker, &self.store, &self.config);
        if started {
            info!(interval_ms = self.config.tick_interval_ms, "Training simulator started");
        }
        started
    }

    pub fn stop(&self) -> bool {
        let stopped = self.ticker.stop();
        if stopped {
            info!("Training simulator stopped");
        }
        stopped
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_running()
    }

    /// Run one tick synchronously with the given RNG
    pub fn tick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> TickControl {
        advance(&self.store, &self.config, rng)
    }

    pub fn store(&self) -> &TrainingStore {
        &self.store
    }
}

fn spawn_ticks(ticker: &Ticker, store: &TrainingStore, config: &TrainingSimConfig) -> bool {
    let store = store.clone();
    let tick_config = config.clone();
    let mut rng = StdRng::from_entropy();
    ticker.start(Duration::from_millis(config.tick_interval_ms), move || {
        advance(&store, &tick_config, &mut rng)
    })
}

/// One simulator tick against `store`.
///
/// Does nothing unless the job is running. All slice updates land in a
/// single store mutation so listeners see one consistent state per tick.
pub fn advance<R: Rng + ?Sized>(
    store: &TrainingStore,
    config: &TrainingSimConfig,
    rng: &mut R,
) -> TickControl {
    if store.status() != TrainingStatus::Running {
        return TickControl::Continue;
    }

    let now_ms = Utc::now().timestamp_millis();
    let mut completed = false;

    store.update(|s| {
        let step = advance_progress(s, config, rng);
        if step.sampled {
            add_curve_sample(s, rng, now_ms);
            refresh_trade_performance(s, rng);
        }
        if rng.gen_bool(config.action_stats_probability.clamp(0.0, 1.0)) {
            refresh_action_stats(s, rng);
        }
        append_candle(s, config, rng, now_ms);
        if rng.gen_bool(config.log_probability.clamp(0.0, 1.0)) {
            s.logs.push_front(generate_training_log(rng));
        }

        completed = step.completed;
        debug!(
            step = s.progress.current_step,
            progress = s.progress.progress,
            eta = s.progress.eta,
            sampled = step.sampled,
            "Training tick"
        );
    });

    if completed {
        store.stop_training();
        info!("Training reached 100%, simulator stopping");
        return TickControl::Stop;
    }
    TickControl::Continue
}

struct ProgressStep {
    /// This tick samples the learning curve
    sampled: bool,
    /// Decided on the unrounded percentage
    completed: bool,
}

/// Step, percent, time and gauge update
fn advance_progress<R: Rng + ?Sized>(
    s: &mut TrainingState,
    config: &TrainingSimConfig,
    rng: &mut R,
) -> ProgressStep {
    let stride = config.step_stride.max(1);
    let p = &mut s.progress;

    p.current_step += stride;
    let exact = if p.total_steps == 0 {
        100.0
    } else {
        (p.current_step as f64 / p.total_steps as f64 * 100.0).min(100.0)
    };
    p.progress = round_to(exact, 1);

    p.elapsed_time += config.tick_interval_ms as f64 / 1000.0;
    let rate = if p.elapsed_time > 0.0 {
        exact / p.elapsed_time
    } else {
        0.0
    };
    p.eta = if rate > 0.0 {
        ((100.0 - exact) / rate).round()
    } else {
        0.0
    };

    p.current_rollout = p.current_step / stride;
    p.gpu_util = 88.0 + rng.gen::<f64>() * 10.0;
    p.memory_used = 17.0 + rng.gen::<f64>() * 3.0;
    p.throughput = 1500.0 + rng.gen::<f64>() * 500.0;

    ProgressStep {
        sampled: p.current_rollout % config.curve_sample_every.max(1) == 0,
        completed: exact >= 100.0,
    }
}

fn add_curve_sample<R: Rng + ?Sized>(s: &mut TrainingState, rng: &mut R, now_ms: i64) {
    let episode = s.last_curve_point().map_or(0, |p| p.episode + 1);
    let point = generate_learning_curve_point(
        rng,
        s.progress.current_step,
        episode,
        s.last_curve_point(),
        now_ms,
    );
    s.learning_curve.push(point);
}

fn refresh_trade_performance<R: Rng + ?Sized>(s: &mut TrainingState, rng: &mut R) {
    let episode = s.last_curve_point().map_or(0, |p| p.episode) as f64;
    let perf = &mut s.trade_performance;
    perf.cumulative_pnl = round_to(12450.0 + episode * 50.0 + (rng.gen::<f64>() - 0.3) * 200.0, 2);
    perf.daily_pnl = round_to(300.0 + (rng.gen::<f64>() - 0.3) * 100.0, 2);
    perf.win_rate = round_to(60.0 + rng.gen::<f64>() * 8.0, 1);
    perf.sharpe_ratio = round_to(1.3 + rng.gen::<f64>() * 0.4, 2);
}

fn refresh_action_stats<R: Rng + ?Sized>(s: &mut TrainingState, rng: &mut R) {
    let stats = &mut s.action_stats;
    stats.long_frequency = 33.0 + rng.gen::<f64>() * 6.0;
    stats.flat_frequency = 38.0 + rng.gen::<f64>() * 6.0;
    stats.short_frequency = 23.0 + rng.gen::<f64>() * 6.0;
    stats.exploration_entropy = 0.6 + rng.gen::<f64>() * 0.3;
}

/// Append a candle chained on the last close, then re-mark the open position and drift equity
fn append_candle<R: Rng + ?Sized>(
    s: &mut TrainingState,
    config: &TrainingSimConfig,
    rng: &mut R,
    now_ms: i64,
) {
    let prev_close = s.last_candle().map_or(config.initial_candle_price, |c| c.close);
    let mut candle = generate_candle(rng, prev_close, now_ms, CANDLE_VOLATILITY);

    if rng.gen_bool(config.agent_action_probability.clamp(0.0, 1.0)) {
        let action = *AgentAction::ALL.choose(rng).unwrap_or(&AgentAction::Flat);
        candle.agent_action = Some(action);
        candle.trade_entry = action != AgentAction::Flat;
    }
    let close = candle.close;
    s.current_episode.price_data.push_back(candle);

    let episode = &mut s.current_episode;
    episode.current_equity += (rng.gen::<f64>() - 0.4) * 50.0;
    episode.equity_change = if episode.start_capital > 0.0 {
        (episode.current_equity - episode.start_capital) / episode.start_capital * 100.0
    } else {
        0.0
    };
    if let Some(position) = episode.open_position.as_mut() {
        position.mark_to_market(close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrainingSimConfig {
        TrainingSimConfig {
            log_probability: 0.0,
            ..TrainingSimConfig::default()
        }
    }

    fn running_store(total_steps: u64) -> TrainingStore {
        let mut state = TrainingState::idle("exp-1", "Test", 200, 100);
        state.status = TrainingStatus::Running;
        state.progress.current_step = 0;
        state.progress.elapsed_time = 0.0;
        state.progress.total_steps = total_steps;
        TrainingStore::new(state)
    }

    #[test]
    fn test_step_advances_by_stride() {
        let store = running_store(500_000);
        let sim = TrainingSimulator::new(store.clone(), config());
        let mut rng = StdRng::seed_from_u64(1);

        for n in 1..=30u64 {
            assert_eq!(sim.tick_with(&mut rng), TickControl::Continue);
            assert_eq!(store.read(|s| s.progress.current_step), n * 2048);
        }
        let s = store.snapshot();
        assert_eq!(s.progress.current_rollout, 30);
        assert_eq!(s.learning_curve.len(), 10);
        assert_eq!(s.current_episode.price_data.len(), 30);
        assert!((s.progress.elapsed_time - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_paused_job_does_not_advance() {
        let store = running_store(500_000);
        store.set_status(TrainingStatus::Paused);
        let sim = TrainingSimulator::new(store.clone(), config());
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(sim.tick_with(&mut rng), TickControl::Continue);
        assert_eq!(store.read(|s| s.progress.current_step), 0);
    }

    #[test]
    fn test_progress_is_clamped() {
        let store = running_store(1000);
        let sim = TrainingSimulator::new(store.clone(), config());
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(sim.tick_with(&mut rng), TickControl::Stop);
        let s = store.snapshot();
        assert_eq!(s.progress.progress, 100.0);
        assert_eq!(s.progress.eta, 0.0);
        assert_eq!(s.status, TrainingStatus::Completed);
    }

    #[test]
    fn test_completion_waits_for_last_step() {
        let store = running_store(4097);
        let sim = TrainingSimulator::new(store.clone(), config());
        let mut rng = StdRng::seed_from_u64(6);

        assert_eq!(sim.tick_with(&mut rng), TickControl::Continue);
        assert_eq!(sim.tick_with(&mut rng), TickControl::Continue);
        let s = store.snapshot();
        assert_eq!(s.progress.current_step, 4096);
        assert_eq!(s.progress.progress, 100.0);
        assert_eq!(s.status, TrainingStatus::Running);

        assert_eq!(sim.tick_with(&mut rng), TickControl::Stop);
        let s = store.snapshot();
        assert_eq!(s.progress.current_step, 6144);
        assert_eq!(s.status, TrainingStatus::Completed);
    }

    #[test]
    fn test_open_position_follows_last_candle() {
        let store = running_store(500_000);
        let sim = TrainingSimulator::new(store.clone(), config());
        let mut rng = StdRng::seed_from_u64(4);

        sim.tick_with(&mut rng);
        let s = store.snapshot();
        let close = s.last_candle().unwrap().close;
        let position = s.current_episode.open_position.unwrap();
        assert_eq!(position.current_price, close);
        assert!((position.unrealized_pnl - (close - position.entry_price) * position.size).abs() < 1e-9);
    }

    #[test]
    fn test_candles_stay_well_formed_and_bounded() {
        let store = running_store(u64::MAX / 2);
        let sim = TrainingSimulator::new(store.clone(), config());
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..250 {
            sim.tick_with(&mut rng);
        }
        let s = store.snapshot();
        assert_eq!(s.current_episode.price_data.len(), 200);
        assert!(s.current_episode.price_data.iter().all(|c| c.is_well_formed()));
    }
}
