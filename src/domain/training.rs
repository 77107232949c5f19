//! Training job data model
//!
//! Plain serializable records describing one simulated training job, plus
//! the patch types used to partially update each slice.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ring_buffer::RingBuffer;

/// Training job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}

impl TrainingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStatus::Idle => "idle",
            TrainingStatus::Running => "running",
            TrainingStatus::Paused => "paused",
            TrainingStatus::Completed => "completed",
            TrainingStatus::Failed => "failed",
        }
    }

    /// Transitions of the nominal job lifecycle.
    ///
    /// The store does not enforce these; it only uses them to flag
    /// out-of-lifecycle transitions in the logs.
    pub fn is_nominal_transition(&self, target: TrainingStatus) -> bool {
        use TrainingStatus::*;

        match (self, target) {
            (Idle, Running) => true,
            (Running, Paused) | (Running, Completed) | (Running, Failed) => true,
            (Paused, Running) => true,
            // Restarting a finished job
            (Completed, Running) | (Failed, Running) => true,
            (Running, Running) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TrainingStatus::Completed | TrainingStatus::Failed)
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters and gauges for the running job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProgress {
    /// Seconds since the job started
    pub elapsed_time: f64,
    /// Estimated seconds remaining
    pub eta: f64,
    /// Percent complete, 0-100
    pub progress: f64,
    pub current_step: u64,
    pub total_steps: u64,
    pub current_rollout: u64,
    pub total_rollouts: u64,
    /// GPU utilisation, 0-100
    pub gpu_util: f64,
    /// GB
    pub memory_used: f64,
    /// GB
    pub memory_total: f64,
    /// Steps per second
    pub throughput: f64,
}

impl Default for TrainingProgress {
    fn default() -> Self {
        Self {
            elapsed_time: 8100.0,
            eta: 20700.0,
            progress: 45.0,
            current_step: 225_000,
            total_steps: 500_000,
            current_rollout: 110,
            total_rollouts: 244,
            gpu_util: 92.0,
            memory_used: 18.5,
            memory_total: 40.0,
            throughput: 1667.0,
        }
    }
}

impl TrainingProgress {
    /// Progress record for a job that has not taken any step yet
    pub fn fresh(eta: f64) -> Self {
        Self {
            progress: 0.0,
            current_step: 0,
            elapsed_time: 0.0,
            eta,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressPatch {
    pub elapsed_time: Option<f64>,
    pub eta: Option<f64>,
    pub progress: Option<f64>,
    pub current_step: Option<u64>,
    pub total_steps: Option<u64>,
    pub current_rollout: Option<u64>,
    pub total_rollouts: Option<u64>,
    pub gpu_util: Option<f64>,
    pub memory_used: Option<f64>,
    pub memory_total: Option<f64>,
    pub throughput: Option<f64>,
}

impl ProgressPatch {
    pub fn apply(self, target: &mut TrainingProgress) {
        let Self {
            elapsed_time,
            eta,
            progress,
            current_step,
            total_steps,
            current_rollout,
            total_rollouts,
            gpu_util,
            memory_used,
            memory_total,
            throughput,
        } = self;

        if let Some(v) = elapsed_time {
            target.elapsed_time = v;
        }
        if let Some(v) = eta {
            target.eta = v;
        }
        if let Some(v) = progress {
            target.progress = v;
        }
        if let Some(v) = current_step {
            target.current_step = v;
        }
        if let Some(v) = total_steps {
            target.total_steps = v;
        }
        if let Some(v) = current_rollout {
            target.current_rollout = v;
        }
        if let Some(v) = total_rollouts {
            target.total_rollouts = v;
        }
        if let Some(v) = gpu_util {
            target.gpu_util = v;
        }
        if let Some(v) = memory_used {
            target.memory_used = v;
        }
        if let Some(v) = memory_total {
            target.memory_total = v;
        }
        if let Some(v) = throughput {
            target.throughput = v;
        }
    }
}

/// One sample of the learning curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningCurvePoint {
    pub step: u64,
    pub episode: u64,
    /// Unix millis
    pub timestamp: i64,
    pub train_return: f64,
    pub eval_return: f64,
    pub rollout_return: f64,
    pub policy_loss: f64,
    pub value_loss: f64,
    pub entropy: f64,
    pub kl_divergence: f64,
}

/// Action distribution of the policy.
///
/// Frequencies are nominally percentages summing to 100; nothing keeps
/// them that way after random refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStats {
    pub long_frequency: f64,
    pub flat_frequency: f64,
    pub short_frequency: f64,
    pub avg_hold_time: f64,
    pub max_hold_time: f64,
    pub exploration_entropy: f64,
}

impl Default for ActionStats {
    fn default() -> Self {
        Self {
            long_frequency: 35.0,
            flat_frequency: 40.0,
            short_frequency: 25.0,
            avg_hold_time: 2.3,
            max_hold_time: 24.0,
            exploration_entropy: 0.72,
        }
    }
}

impl ActionStats {
    /// Frequencies rescaled so they sum to 100 (read-side only)
    pub fn normalized(&self) -> (f64, f64, f64) {
        let total = self.long_frequency + self.flat_frequency + self.short_frequency;
        if total <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        (
            self.long_frequency / total * 100.0,
            self.flat_frequency / total * 100.0,
            self.short_frequency / total * 100.0,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionStatsPatch {
    pub long_frequency: Option<f64>,
    pub flat_frequency: Option<f64>,
    pub short_frequency: Option<f64>,
    pub avg_hold_time: Option<f64>,
    pub max_hold_time: Option<f64>,
    pub exploration_entropy: Option<f64>,
}

impl ActionStatsPatch {
    pub fn apply(self, target: &mut ActionStats) {
        let Self {
            long_frequency,
            flat_frequency,
            short_frequency,
            avg_hold_time,
            max_hold_time,
            exploration_entropy,
        } = self;

        if let Some(v) = long_frequency {
            target.long_frequency = v;
        }
        if let Some(v) = flat_frequency {
            target.flat_frequency = v;
        }
        if let Some(v) = short_frequency {
            target.short_frequency = v;
        }
        if let Some(v) = avg_hold_time {
            target.avg_hold_time = v;
        }
        if let Some(v) = max_hold_time {
            target.max_hold_time = v;
        }
        if let Some(v) = exploration_entropy {
            target.exploration_entropy = v;
        }
    }
}

/// Observation normalisation diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateHealth {
    pub mean_centered: bool,
    pub unit_variance: bool,
    /// 0-100
    pub obs_coverage: f64,
    pub nan_count: u64,
    pub inf_count: u64,
}

impl Default for StateHealth {
    fn default() -> Self {
        Self {
            mean_centered: true,
            unit_variance: true,
            obs_coverage: 40.0,
            nan_count: 0,
            inf_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateHealthPatch {
    pub mean_centered: Option<bool>,
    pub unit_variance: Option<bool>,
    pub obs_coverage: Option<f64>,
    pub nan_count: Option<u64>,
    pub inf_count: Option<u64>,
}

impl StateHealthPatch {
    pub fn apply(self, target: &mut StateHealth) {
        let Self {
            mean_centered,
            unit_variance,
            obs_coverage,
            nan_count,
            inf_count,
        } = self;

        if let Some(v) = mean_centered {
            target.mean_centered = v;
        }
        if let Some(v) = unit_variance {
            target.unit_variance = v;
        }
        if let Some(v) = obs_coverage {
            target.obs_coverage = v;
        }
        if let Some(v) = nan_count {
            target.nan_count = v;
        }
        if let Some(v) = inf_count {
            target.inf_count = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePerformance {
    pub win_rate: f64,
    pub avg_pnl: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub daily_pnl: f64,
    pub cumulative_pnl: f64,
}

impl Default for TradePerformance {
    fn default() -> Self {
        Self {
            win_rate: 62.0,
            avg_pnl: 45.0,
            max_drawdown: 8.5,
            sharpe_ratio: 1.45,
            daily_pnl: 320.0,
            cumulative_pnl: 12450.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TradePerformancePatch {
    pub win_rate: Option<f64>,
    pub avg_pnl: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub daily_pnl: Option<f64>,
    pub cumulative_pnl: Option<f64>,
}

impl TradePerformancePatch {
    pub fn apply(self, target: &mut TradePerformance) {
        let Self {
            win_rate,
            avg_pnl,
            max_drawdown,
            sharpe_ratio,
            daily_pnl,
            cumulative_pnl,
        } = self;

        if let Some(v) = win_rate {
            target.win_rate = v;
        }
        if let Some(v) = avg_pnl {
            target.avg_pnl = v;
        }
        if let Some(v) = max_drawdown {
            target.max_drawdown = v;
        }
        if let Some(v) = sharpe_ratio {
            target.sharpe_ratio = v;
        }
        if let Some(v) = daily_pnl {
            target.daily_pnl = v;
        }
        if let Some(v) = cumulative_pnl {
            target.cumulative_pnl = v;
        }
    }
}

/// Agent action annotation on a candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentAction {
    Long,
    Flat,
    Short,
}

impl AgentAction {
    pub const ALL: [AgentAction; 3] = [AgentAction::Long, AgentAction::Flat, AgentAction::Short];

    /// +1 for long, -1 for short, 0 for flat
    pub fn direction(&self) -> f64 {
        match self {
            AgentAction::Long => 1.0,
            AgentAction::Flat => 0.0,
            AgentAction::Short => -1.0,
        }
    }
}

/// OHLCV bar with optional agent annotations.
///
/// Generated candles satisfy `low <= min(open, close)` and
/// `high >= max(open, close)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleData {
    /// Unix millis
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_action: Option<AgentAction>,
    #[serde(default)]
    pub trade_entry: bool,
    #[serde(default)]
    pub trade_exit: bool,
}

impl CandleData {
    pub fn is_well_formed(&self) -> bool {
        self.low <= self.open.min(self.close) && self.high >= self.open.max(self.close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EpisodeAction {
    Buy,
    Sell,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeTrade {
    pub id: u64,
    pub action: EpisodeAction,
    pub entry_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    pub pnl: f64,
    /// Minutes
    pub duration: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    #[serde(rename = "type")]
    pub side: AgentAction,
    pub size: f64,
    pub entry_price: f64,
    pub current_price: f64,
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: f64,
}

impl OpenPosition {
    /// Re-price the position and recompute its unrealised PnL
    pub fn mark_to_market(&mut self, price: f64) {
        self.current_price = price;
        self.unrealized_pnl = (price - self.entry_price) * self.size * self.side.direction();
    }
}

/// Snapshot of the episode currently being played by the agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentEpisode {
    pub start_capital: f64,
    pub current_equity: f64,
    /// Percent change of equity against start capital
    pub equity_change: f64,
    pub open_position: Option<OpenPosition>,
    pub recent_trades: Vec<EpisodeTrade>,
    pub price_data: RingBuffer<CandleData>,
}

impl CurrentEpisode {
    pub fn new(candle_capacity: usize) -> Self {
        Self {
            start_capital: 10000.0,
            current_equity: 10450.0,
            equity_change: 4.5,
            open_position: Some(OpenPosition {
                side: AgentAction::Long,
                size: 0.05,
                entry_price: 42300.0,
                current_price: 42520.0,
                unrealized_pnl: 215.0,
            }),
            recent_trades: Vec::new(),
            price_data: RingBuffer::new(candle_capacity),
        }
    }
}

/// Partial update of the current episode; `price_data` is only touched
/// through the candle append operation.
#[derive(Debug, Clone, Default)]
pub struct EpisodePatch {
    pub start_capital: Option<f64>,
    pub current_equity: Option<f64>,
    pub equity_change: Option<f64>,
    pub open_position: Option<Option<OpenPosition>>,
    pub recent_trades: Option<Vec<EpisodeTrade>>,
}

impl EpisodePatch {
    pub fn apply(self, target: &mut CurrentEpisode) {
        let Self {
            start_capital,
            current_equity,
            equity_change,
            open_position,
            recent_trades,
        } = self;

        if let Some(v) = start_capital {
            target.start_capital = v;
        }
        if let Some(v) = current_equity {
            target.current_equity = v;
        }
        if let Some(v) = equity_change {
            target.equity_change = v;
        }
        if let Some(v) = open_position {
            target.open_position = v;
        }
        if let Some(v) = recent_trades {
            target.recent_trades = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    pub id: String,
    /// Unix millis
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestCheckpoint {
    pub step: u64,
    pub sharpe: f64,
    pub saved_at: i64,
}

/// Full state of the single simulated training job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingState {
    pub experiment_id: String,
    pub experiment_name: String,
    pub status: TrainingStatus,
    pub progress: TrainingProgress,
    pub learning_curve: Vec<LearningCurvePoint>,
    pub action_stats: ActionStats,
    pub state_health: StateHealth,
    pub trade_performance: TradePerformance,
    pub current_episode: CurrentEpisode,
    /// Newest first
    pub logs: RingBuffer<TrainingLog>,
    pub best_checkpoint: Option<BestCheckpoint>,
}

impl TrainingState {
    /// State after an explicit reset: nothing running, nothing recorded
    pub fn idle(experiment_id: &str, experiment_name: &str, candle_capacity: usize, log_capacity: usize) -> Self {
        Self {
            experiment_id: experiment_id.to_string(),
            experiment_name: experiment_name.to_string(),
            status: TrainingStatus::Idle,
            progress: TrainingProgress::fresh(TrainingProgress::default().eta),
            learning_curve: Vec::new(),
            action_stats: ActionStats::default(),
            state_health: StateHealth::default(),
            trade_performance: TradePerformance {
                cumulative_pnl: 0.0,
                ..TradePerformance::default()
            },
            current_episode: CurrentEpisode::new(candle_capacity),
            logs: RingBuffer::new(log_capacity),
            best_checkpoint: None,
        }
    }

    pub fn last_candle(&self) -> Option<&CandleData> {
        self.current_episode.price_data.back()
    }

    pub fn last_curve_point(&self) -> Option<&LearningCurvePoint> {
        self.learning_curve.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_patch_only_touches_given_fields() {
        let mut progress = TrainingProgress::default();
        ProgressPatch {
            current_step: Some(4096),
            throughput: Some(1800.0),
            ..Default::default()
        }
        .apply(&mut progress);

        assert_eq!(progress.current_step, 4096);
        assert_eq!(progress.throughput, 1800.0);
        assert_eq!(progress.total_steps, 500_000);
        assert_eq!(progress.memory_total, 40.0);
    }

    #[test]
    fn test_nominal_transitions() {
        use TrainingStatus::*;
        assert!(Idle.is_nominal_transition(Running));
        assert!(Paused.is_nominal_transition(Running));
        assert!(!Completed.is_nominal_transition(Paused));
        assert!(!Idle.is_nominal_transition(Completed));
    }

    #[test]
    fn test_normalized_action_stats() {
        let stats = ActionStats {
            long_frequency: 36.0,
            flat_frequency: 42.0,
            short_frequency: 27.0,
            ..ActionStats::default()
        };
        let (l, f, s) = stats.normalized();
        assert!((l + f + s - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_mark_to_market_short() {
        let mut position = OpenPosition {
            side: AgentAction::Short,
            size: 0.5,
            entry_price: 100.0,
            current_price: 100.0,
            unrealized_pnl: 0.0,
        };
        position.mark_to_market(90.0);
        assert_eq!(position.unrealized_pnl, 5.0);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TrainingStatus::Running).unwrap(), "\"running\"");
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"WARN\"");
    }
}
