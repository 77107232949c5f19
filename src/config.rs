use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub training: TrainingSimConfig,
    #[serde(default)]
    pub price_stream: PriceStreamConfig,
    #[serde(default)]
    pub live_feed: LiveFeedConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingSimConfig {
    /// Wall-clock cadence of the simulator in milliseconds
    #[serde(default = "default_training_tick_ms")]
    pub tick_interval_ms: u64,
    /// Start ticking as soon as the simulator is attached
    #[serde(default = "default_true")]
    pub auto_start: bool,
    /// Steps added to the counter on every tick
    #[serde(default = "default_step_stride")]
    pub step_stride: u64,
    /// A learning-curve sample is appended every N-th rollout
    #[serde(default = "default_curve_sample_every")]
    pub curve_sample_every: u64,
    /// Price candles kept in the current episode window
    #[serde(default = "default_candle_capacity")]
    pub candle_capacity: usize,
    /// Training log lines kept (newest first)
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Chance per tick of refreshing action frequencies
    #[serde(default = "default_action_stats_probability")]
    pub action_stats_probability: f64,
    /// Chance per tick of emitting a synthetic log line
    #[serde(default = "default_log_probability")]
    pub log_probability: f64,
    /// Chance that a new candle carries an agent action marker
    #[serde(default = "default_agent_action_probability")]
    pub agent_action_probability: f64,
    /// Seed price when the candle window is empty
    #[serde(default = "default_initial_candle_price")]
    pub initial_candle_price: f64,
}

fn default_training_tick_ms() -> u64 {
    1500
}

fn default_true() -> bool {
    true
}

fn default_step_stride() -> u64 {
    2048
}

fn default_curve_sample_every() -> u64 {
    3
}

fn default_candle_capacity() -> usize {
    200
}

fn default_log_capacity() -> usize {
    100
}

fn default_action_stats_probability() -> f64 {
    0.3
}

fn default_log_probability() -> f64 {
    0.2
}

fn default_agent_action_probability() -> f64 {
    0.15
}

fn default_initial_candle_price() -> f64 {
    41500.0
}

impl Default for TrainingSimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_training_tick_ms(),
            auto_start: true,
            step_stride: default_step_stride(),
            curve_sample_every: default_curve_sample_every(),
            candle_capacity: default_candle_capacity(),
            log_capacity: default_log_capacity(),
            action_stats_probability: default_action_stats_probability(),
            log_probability: default_log_probability(),
            agent_action_probability: default_agent_action_probability(),
            initial_candle_price: default_initial_candle_price(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceStreamConfig {
    /// Baseline price captured at stream start
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,
    #[serde(default = "default_price_tick_ms")]
    pub tick_interval_ms: u64,
    /// Maximum (timestamp, price) pairs retained
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Half-width of the uniform per-tick move (0.0002 = 2 bps)
    #[serde(default = "default_volatility")]
    pub volatility: f64,
}

fn default_initial_price() -> f64 {
    42520.0
}

fn default_price_tick_ms() -> u64 {
    1000
}

fn default_history_capacity() -> usize {
    100
}

fn default_volatility() -> f64 {
    0.0002
}

impl Default for PriceStreamConfig {
    fn default() -> Self {
        Self {
            initial_price: default_initial_price(),
            tick_interval_ms: default_price_tick_ms(),
            history_capacity: default_history_capacity(),
            volatility: default_volatility(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveFeedConfig {
    #[serde(default = "default_live_tick_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_alert_probability")]
    pub alert_probability: f64,
    #[serde(default = "default_trade_probability")]
    pub trade_probability: f64,
    #[serde(default = "default_alert_capacity")]
    pub alert_capacity: usize,
    #[serde(default = "default_trade_capacity")]
    pub trade_capacity: usize,
}

fn default_live_tick_ms() -> u64 {
    5000
}

fn default_alert_probability() -> f64 {
    0.3
}

fn default_trade_probability() -> f64 {
    0.2
}

fn default_alert_capacity() -> usize {
    20
}

fn default_trade_capacity() -> usize {
    24
}

impl Default for LiveFeedConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_live_tick_ms(),
            alert_probability: default_alert_probability(),
            trade_probability: default_trade_probability(),
            alert_capacity: default_alert_capacity(),
            trade_capacity: default_trade_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BacktestConfig {
    /// Delay before a mock report replaces the current one
    #[serde(default = "default_backtest_delay_ms")]
    pub simulated_delay_ms: u64,
}

fn default_backtest_delay_ms() -> u64 {
    2000
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            simulated_delay_ms: default_backtest_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backing file for durable local storage (defaults to the user data dir)
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Key under which the experiment preferences blob is stored
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "experiment-store".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            namespace: default_namespace(),
        }
    }
}

impl StorageConfig {
    /// Resolve the storage file, falling back to `<data_dir>/rlboard/local_storage.json`
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("rlboard")
            .join("local_storage.json")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/demo.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("RLBOARD_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (RLBOARD_TRAINING__TICK_INTERVAL_MS, etc.)
            .add_source(
                Environment::with_prefix("RLBOARD")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.training.tick_interval_ms == 0 {
            errors.push("training.tick_interval_ms must be positive".to_string());
        }
        if self.training.step_stride == 0 {
            errors.push("training.step_stride must be positive".to_string());
        }
        if self.training.curve_sample_every == 0 {
            errors.push("training.curve_sample_every must be positive".to_string());
        }
        if self.training.candle_capacity == 0 || self.training.log_capacity == 0 {
            errors.push("training buffer capacities must be positive".to_string());
        }

        let probabilities = [
            ("training.action_stats_probability", self.training.action_stats_probability),
            ("training.log_probability", self.training.log_probability),
            ("training.agent_action_probability", self.training.agent_action_probability),
            ("live_feed.alert_probability", self.live_feed.alert_probability),
            ("live_feed.trade_probability", self.live_feed.trade_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                errors.push(format!("{name} must be between 0 and 1, got {p}"));
            }
        }

        if self.price_stream.tick_interval_ms == 0 {
            errors.push("price_stream.tick_interval_ms must be positive".to_string());
        }
        if self.price_stream.history_capacity == 0 {
            errors.push("price_stream.history_capacity must be positive".to_string());
        }
        if self.price_stream.initial_price <= 0.0 {
            errors.push("price_stream.initial_price must be positive".to_string());
        }
        if self.live_feed.tick_interval_ms == 0 {
            errors.push("live_feed.tick_interval_ms must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
