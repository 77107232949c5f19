//! Training state store
//!
//! One shared record for the single simulated training job. Status changes
//! are plain assignments: the store never refuses a transition, it only
//! logs the ones outside the nominal lifecycle.

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use super::observable::{Store, Subscription};
use crate::config::TrainingSimConfig;
use crate::domain::{
    ActionStatsPatch, BestCheckpoint, CandleData, CurrentEpisode, EpisodeAction, EpisodePatch,
    EpisodeTrade, LearningCurvePoint, LogLevel, ProgressPatch, RingBuffer, StateHealthPatch,
    TradePerformance, TradePerformancePatch, TrainingLog, TrainingProgress, TrainingState, TrainingStatus,
};
use crate::mock::{generate_initial_candles, generate_initial_learning_curve};

/// ETA shown for a freshly started job (8 hours)
pub const FRESH_JOB_ETA_SECS: f64 = 28_800.0;

const DEMO_EXPERIMENT_ID: &str = "exp-002";
const DEMO_EXPERIMENT_NAME: &str = "DQN_ETHUSDT_ICT";
const DEMO_CURVE_POINTS: u64 = 111;

/// Closed trades shown for the demo episode, newest first
fn seed_recent_trades(now_ms: i64) -> Vec<EpisodeTrade> {
    let minutes_ago = |m: i64| now_ms - m * 60_000;
    vec![
        EpisodeTrade {
            id: 10,
            action: EpisodeAction::Buy,
            entry_price: 42300.0,
            exit_price: None,
            pnl: 120.0,
            duration: 78,
            timestamp: minutes_ago(78),
        },
        EpisodeTrade {
            id: 9,
            action: EpisodeAction::Sell,
            entry_price: 42100.0,
            exit_price: Some(42300.0),
            pnl: 85.0,
            duration: 126,
            timestamp: minutes_ago(204),
        },
        EpisodeTrade {
            id: 8,
            action: EpisodeAction::Buy,
            entry_price: 42050.0,
            exit_price: Some(42100.0),
            pnl: -45.0,
            duration: 48,
            timestamp: minutes_ago(252),
        },
        EpisodeTrade {
            id: 7,
            action: EpisodeAction::Flat,
            entry_price: 41800.0,
            exit_price: Some(42050.0),
            pnl: 235.0,
            duration: 252,
            timestamp: minutes_ago(504),
        },
    ]
}

fn seed_logs(now_ms: i64, capacity: usize) -> RingBuffer<TrainingLog> {
    let lines = [
        (LogLevel::Info, "Step 225000: Checkpoint saved"),
        (LogLevel::Info, "Episode 110 complete. Reward: +1250.5"),
        (LogLevel::Warn, "High gradient norm detected (2.5). Step 224500"),
        (LogLevel::Info, "Best model updated (Sharpe: 1.65)"),
        (LogLevel::Info, "Learning rate adjusted: 3e-4 → 2.8e-4"),
    ];

    RingBuffer::from_iter_back(
        capacity,
        lines.iter().enumerate().map(|(i, (level, message))| TrainingLog {
            id: format!("log-{}", i + 1),
            timestamp: now_ms - (i as i64 + 1) * 60_000,
            level: *level,
            message: message.to_string(),
        }),
    )
}

/// Demo job that is already 45% through training
pub fn demo_training_state<R: Rng + ?Sized>(
    rng: &mut R,
    candle_capacity: usize,
    log_capacity: usize,
    initial_candle_price: f64,
    step_stride: u64,
    now_ms: i64,
) -> TrainingState {
    let mut episode = CurrentEpisode::new(candle_capacity);
    episode.recent_trades = seed_recent_trades(now_ms);
    episode.price_data.extend_back(generate_initial_candles(
        rng,
        candle_capacity,
        initial_candle_price,
        now_ms,
    ));

    TrainingState {
        status: TrainingStatus::Running,
        progress: TrainingProgress::default(),
        trade_performance: TradePerformance::default(),
        learning_curve: generate_initial_learning_curve(rng, DEMO_CURVE_POINTS, step_stride, now_ms),
        current_episode: episode,
        logs: seed_logs(now_ms, log_capacity),
        best_checkpoint: Some(BestCheckpoint {
            step: 200_000,
            sharpe: 1.65,
            saved_at: now_ms - 3_600_000,
        }),
        ..TrainingState::idle(DEMO_EXPERIMENT_ID, DEMO_EXPERIMENT_NAME, candle_capacity, log_capacity)
    }
}

#[derive(Clone)]
pub struct TrainingStore {
    state: Store<TrainingState>,
}

impl TrainingStore {
    pub fn new(initial: TrainingState) -> Self {
        Self {
            state: Store::new(initial),
        }
    }

    /// Store seeded with the running demo job
    pub fn demo(config: &TrainingSimConfig) -> Self {
        let mut rng = rand::thread_rng();
        Self::new(demo_training_state(
            &mut rng,
            config.candle_capacity,
            config.log_capacity,
            config.initial_candle_price,
            config.step_stride,
            Utc::now().timestamp_millis(),
        ))
    }

    pub fn snapshot(&self) -> TrainingState {
        self.state.get()
    }

    pub fn read<R>(&self, f: impl FnOnce(&TrainingState) -> R) -> R {
        self.state.read(f)
    }

    /// Apply several changes as one notification
    pub fn update(&self, f: impl FnOnce(&mut TrainingState)) {
        self.state.update(f);
    }

    pub fn status(&self) -> TrainingStatus {
        self.state.read(|s| s.status)
    }

    pub fn store(&self) -> &Store<TrainingState> {
        &self.state
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TrainingState) + Send + Sync + 'static,
    {
        self.state.subscribe(listener)
    }

    pub fn set_status(&self, status: TrainingStatus) {
        self.state.update(|s| transition(s, status));
    }

    pub fn update_progress(&self, patch: ProgressPatch) {
        self.state.update(|s| patch.apply(&mut s.progress));
    }

    pub fn add_learning_curve_point(&self, point: LearningCurvePoint) {
        self.state.update(|s| s.learning_curve.push(point));
    }

    pub fn update_action_stats(&self, patch: ActionStatsPatch) {
        self.state.update(|s| patch.apply(&mut s.action_stats));
    }

    pub fn update_state_health(&self, patch: StateHealthPatch) {
        self.state.update(|s| patch.apply(&mut s.state_health));
    }

    pub fn update_trade_performance(&self, patch: TradePerformancePatch) {
        self.state.update(|s| patch.apply(&mut s.trade_performance));
    }

    pub fn update_current_episode(&self, patch: EpisodePatch) {
        self.state.update(|s| patch.apply(&mut s.current_episode));
    }

    /// Prepend a log line; the oldest line drops off once the buffer is full
    pub fn add_log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        self.state.update(|s| push_log(s, level, message));
    }

    pub fn add_price_candle(&self, candle: CandleData) {
        self.state.update(|s| {
            s.current_episode.price_data.push_back(candle);
        });
    }

    /// Back to idle with nothing recorded; the experiment identity is kept
    pub fn reset(&self) {
        self.state.update(|s| {
            let candle_capacity = s.current_episode.price_data.capacity();
            let log_capacity = s.logs.capacity();
            let mut fresh =
                TrainingState::idle(&s.experiment_id, &s.experiment_name, candle_capacity, log_capacity);
            fresh.current_episode.recent_trades = seed_recent_trades(Utc::now().timestamp_millis());
            *s = fresh;
        });
        info!("Training state reset");
    }

    /// Begin a new job: zeroed progress, empty curve, a single start log line
    pub fn start_training(&self, experiment_id: &str, experiment_name: &str) {
        self.state.update(|s| {
            s.experiment_id = experiment_id.to_string();
            s.experiment_name = experiment_name.to_string();
            transition(s, TrainingStatus::Running);
            s.progress = TrainingProgress::fresh(FRESH_JOB_ETA_SECS);
            s.learning_curve.clear();
            s.logs.clear();
            s.logs.push_front(TrainingLog {
                id: "log-start".to_string(),
                timestamp: Utc::now().timestamp_millis(),
                level: LogLevel::Info,
                message: format!("Training started for {experiment_name}"),
            });
        });
        info!(experiment_id, experiment_name, "Training started");
    }

    pub fn pause_training(&self) {
        self.change_status_with_log(TrainingStatus::Paused, "Training paused");
    }

    pub fn resume_training(&self) {
        self.change_status_with_log(TrainingStatus::Running, "Training resumed");
    }

    pub fn stop_training(&self) {
        self.change_status_with_log(TrainingStatus::Completed, "Training stopped. Final checkpoint saved.");
    }

    fn change_status_with_log(&self, status: TrainingStatus, message: &str) {
        self.state.update(|s| {
            transition(s, status);
            push_log(s, LogLevel::Info, message.to_string());
        });
        info!(status = %status, "{message}");
    }
}

fn transition(state: &mut TrainingState, target: TrainingStatus) {
    if !state.status.is_nominal_transition(target) {
        warn!(
            from = %state.status,
            to = %target,
            experiment_id = %state.experiment_id,
            "Applying training status change outside the nominal lifecycle"
        );
    }
    state.status = target;
}

fn push_log(state: &mut TrainingState, level: LogLevel, message: String) {
    state.logs.push_front(TrainingLog {
        id: format!("log-{}", Uuid::new_v4().simple()),
        timestamp: Utc::now().timestamp_millis(),
        level,
        message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn demo_store() -> TrainingStore {
        let mut rng = StdRng::seed_from_u64(17);
        TrainingStore::new(demo_training_state(&mut rng, 200, 100, 41500.0, 2048, 1_700_000_000_000))
    }

    #[test]
    fn test_demo_state() {
        let s = demo_store().snapshot();
        assert_eq!(s.experiment_id, "exp-002");
        assert_eq!(s.status, TrainingStatus::Running);
        assert_eq!(s.progress.progress, 45.0);
        assert_eq!(s.learning_curve.len(), 111);
        assert_eq!(s.current_episode.price_data.len(), 200);
        assert_eq!(s.current_episode.recent_trades.len(), 4);
        assert_eq!(s.logs.len(), 5);
        assert_eq!(s.logs.front().unwrap().message, "Step 225000: Checkpoint saved");
        assert_eq!(s.best_checkpoint.as_ref().unwrap().step, 200_000);
    }

    #[test]
    fn test_start_training_resets_job() {
        let store = demo_store();
        store.start_training("exp-9", "Fresh");
        let s = store.snapshot();
        assert_eq!(s.status, TrainingStatus::Running);
        assert_eq!(s.progress.current_step, 0);
        assert_eq!(s.progress.eta, FRESH_JOB_ETA_SECS);
        assert!(s.learning_curve.is_empty());
        assert_eq!(s.logs.len(), 1);
        assert_eq!(s.logs.front().unwrap().message, "Training started for Fresh");
        // Candle window survives a restart
        assert_eq!(s.current_episode.price_data.len(), 200);
    }

    #[test]
    fn test_logs_newest_first_and_bounded() {
        let store = demo_store();
        for i in 0..250 {
            store.add_log(LogLevel::Debug, format!("line {i}"));
        }
        let s = store.snapshot();
        assert_eq!(s.logs.len(), 100);
        assert_eq!(s.logs.front().unwrap().message, "line 249");
        assert_eq!(s.logs.back().unwrap().message, "line 150");
    }

    #[test]
    fn test_pause_after_complete_is_applied() {
        let store = demo_store();
        store.stop_training();
        store.pause_training();
        let s = store.snapshot();
        assert_eq!(s.status, TrainingStatus::Paused);
        assert_eq!(s.logs.get(0).unwrap().message, "Training paused");
        assert_eq!(s.logs.get(1).unwrap().message, "Training stopped. Final checkpoint saved.");
    }

    #[test]
    fn test_reset_keeps_identity() {
        let store = demo_store();
        store.reset();
        let s = store.snapshot();
        assert_eq!(s.status, TrainingStatus::Idle);
        assert_eq!(s.experiment_id, "exp-002");
        assert_eq!(s.progress.progress, 0.0);
        assert_eq!(s.trade_performance.cumulative_pnl, 0.0);
        assert!(s.learning_curve.is_empty());
        assert!(s.logs.is_empty());
        assert!(s.best_checkpoint.is_none());
        assert_eq!(s.logs.capacity(), 100);
    }

    #[test]
    fn test_candle_window_is_bounded() {
        let store = demo_store();
        let last = store.read(|s| s.last_candle().cloned()).unwrap();
        for i in 0..10 {
            let mut candle = last.clone();
            candle.timestamp += i + 1;
            store.add_price_candle(candle);
        }
        let s = store.snapshot();
        assert_eq!(s.current_episode.price_data.len(), 200);
        assert_eq!(s.last_candle().unwrap().timestamp, last.timestamp + 10);
    }
}
