//! Experiment configuration tree
//!
//! Every subtree has a `Default` matching the wizard's starting values and
//! a patch type that merges supplied fields and leaves the rest untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Coinbase,
    Kraken,
    Bybit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketSymbol {
    #[serde(rename = "BTCUSDT")]
    BtcUsdt,
    #[serde(rename = "ETHUSDT")]
    EthUsdt,
    #[serde(rename = "BNBUSDT")]
    BnbUsdt,
    #[serde(rename = "SOLUSDT")]
    SolUsdt,
    #[serde(rename = "XRPUSDT")]
    XrpUsdt,
}

impl MarketSymbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSymbol::BtcUsdt => "BTCUSDT",
            MarketSymbol::EthUsdt => "ETHUSDT",
            MarketSymbol::BnbUsdt => "BNBUSDT",
            MarketSymbol::SolUsdt => "SOLUSDT",
            MarketSymbol::XrpUsdt => "XRPUSDT",
        }
    }
}

impl fmt::Display for MarketSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub fn minutes(&self) -> u64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Algorithm {
    Ppo,
    Dqn,
    A3c,
    Trpo,
    Sac,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Ppo => "PPO",
            Algorithm::Dqn => "DQN",
            Algorithm::A3c => "A3C",
            Algorithm::Trpo => "TRPO",
            Algorithm::Sac => "SAC",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    Dense,
    #[serde(rename = "LSTM")]
    Lstm,
    #[serde(rename = "CNN")]
    Cnn,
    Transformer,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFunction {
    Shared,
    Separate,
}

/// Named hyperparameter presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Aggressive,
    Balanced,
    Conservative,
}

/// The subset of hyperparameters a preset overwrites
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetValues {
    pub learning_rate: f64,
    pub entropy_coefficient: f64,
    pub discount_factor: f64,
    pub clip_ratio: f64,
}

impl Preset {
    pub fn values(&self) -> PresetValues {
        match self {
            Preset::Aggressive => PresetValues {
                learning_rate: 0.001,
                entropy_coefficient: 0.05,
                discount_factor: 0.95,
                clip_ratio: 0.3,
            },
            Preset::Balanced => PresetValues {
                learning_rate: 0.0003,
                entropy_coefficient: 0.01,
                discount_factor: 0.99,
                clip_ratio: 0.2,
            },
            Preset::Conservative => PresetValues {
                learning_rate: 0.0001,
                entropy_coefficient: 0.005,
                discount_factor: 0.995,
                clip_ratio: 0.1,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Aggressive => "aggressive",
            Preset::Balanced => "balanced",
            Preset::Conservative => "conservative",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Preset {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "aggressive" => Ok(Preset::Aggressive),
            "balanced" => Ok(Preset::Balanced),
            "conservative" => Ok(Preset::Conservative),
            _ => Err(format!("Unknown preset: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardFunction {
    PurePnl,
    SharpeBased,
    SortinoBased,
    CustomWeighted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Draft,
    Training,
    Completed,
    Failed,
    Deployed,
}

impl ExperimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentStatus::Draft => "draft",
            ExperimentStatus::Training => "training",
            ExperimentStatus::Completed => "completed",
            ExperimentStatus::Failed => "failed",
            ExperimentStatus::Deployed => "deployed",
        }
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Momentum,
    Trend,
    Volatility,
    Volume,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: String,
    pub name: String,
    pub category: IndicatorCategory,
    pub enabled: bool,
}

impl Indicator {
    fn new(id: &str, name: &str, category: IndicatorCategory, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            enabled,
        }
    }

    /// Indicator catalogue a new timeframe starts with
    pub fn default_set() -> Vec<Indicator> {
        use IndicatorCategory::*;
        vec![
            Self::new("ohlcv", "OHLCV", Trend, true),
            Self::new("rsi", "RSI", Momentum, true),
            Self::new("bb", "Bollinger Bands", Volatility, true),
            Self::new("macd", "MACD", Momentum, false),
            Self::new("ema", "EMA", Trend, false),
            Self::new("sma", "SMA", Trend, false),
            Self::new("atr", "ATR", Volatility, false),
            Self::new("volume", "Volume", Volume, true),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeConfig {
    pub id: String,
    pub timeframe: Timeframe,
    /// Bars of history fed to the model
    pub lookback: u32,
    pub indicators: Vec<Indicator>,
}

impl Default for TimeframeConfig {
    fn default() -> Self {
        Self {
            id: "tf-1".to_string(),
            timeframe: Timeframe::H1,
            lookback: 168,
            indicators: Indicator::default_set(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeframePatch {
    pub timeframe: Option<Timeframe>,
    pub lookback: Option<u32>,
    pub indicators: Option<Vec<Indicator>>,
}

impl TimeframePatch {
    pub fn apply(self, target: &mut TimeframeConfig) {
        let Self {
            timeframe,
            lookback,
            indicators,
        } = self;

        if let Some(v) = timeframe {
            target.timeframe = v;
        }
        if let Some(v) = lookback {
            target.lookback = v;
        }
        if let Some(v) = indicators {
            target.indicators = v;
        }
    }
}

/// ICT (inner circle trader) structural features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IctFeatures {
    pub order_block: bool,
    pub fair_value_gap: bool,
    pub market_structure: bool,
    pub liquidity_pools: bool,
    pub institutional_flow: bool,
}

impl Default for IctFeatures {
    fn default() -> Self {
        Self {
            order_block: true,
            fair_value_gap: true,
            market_structure: true,
            liquidity_pools: true,
            institutional_flow: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IctFeaturesPatch {
    pub order_block: Option<bool>,
    pub fair_value_gap: Option<bool>,
    pub market_structure: Option<bool>,
    pub liquidity_pools: Option<bool>,
    pub institutional_flow: Option<bool>,
}

impl IctFeaturesPatch {
    pub fn apply(self, target: &mut IctFeatures) {
        let Self {
            order_block,
            fair_value_gap,
            market_structure,
            liquidity_pools,
            institutional_flow,
        } = self;

        if let Some(v) = order_block {
            target.order_block = v;
        }
        if let Some(v) = fair_value_gap {
            target.fair_value_gap = v;
        }
        if let Some(v) = market_structure {
            target.market_structure = v;
        }
        if let Some(v) = liquidity_pools {
            target.liquidity_pools = v;
        }
        if let Some(v) = institutional_flow {
            target.institutional_flow = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    pub exchange: Exchange,
    pub symbol: MarketSymbol,
    pub base_timeframe: Timeframe,
    /// ISO date (YYYY-MM-DD)
    pub start_date: String,
    pub end_date: String,
    pub include_on_chain: bool,
    pub include_open_interest: bool,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            exchange: Exchange::Binance,
            symbol: MarketSymbol::BtcUsdt,
            base_timeframe: Timeframe::H1,
            start_date: "2023-01-01".to_string(),
            end_date: "2025-12-31".to_string(),
            include_on_chain: false,
            include_open_interest: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DataSourcePatch {
    pub exchange: Option<Exchange>,
    pub symbol: Option<MarketSymbol>,
    pub base_timeframe: Option<Timeframe>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub include_on_chain: Option<bool>,
    pub include_open_interest: Option<bool>,
}

impl DataSourcePatch {
    pub fn apply(self, target: &mut DataSourceConfig) {
        let Self {
            exchange,
            symbol,
            base_timeframe,
            start_date,
            end_date,
            include_on_chain,
            include_open_interest,
        } = self;

        if let Some(v) = exchange {
            target.exchange = v;
        }
        if let Some(v) = symbol {
            target.symbol = v;
        }
        if let Some(v) = base_timeframe {
            target.base_timeframe = v;
        }
        if let Some(v) = start_date {
            target.start_date = v;
        }
        if let Some(v) = end_date {
            target.end_date = v;
        }
        if let Some(v) = include_on_chain {
            target.include_on_chain = v;
        }
        if let Some(v) = include_open_interest {
            target.include_open_interest = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureConfig {
    pub data_source: DataSourceConfig,
    pub timeframes: Vec<TimeframeConfig>,
    pub ict_features: IctFeatures,
    pub total_features: u32,
    pub estimated_memory: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            data_source: DataSourceConfig::default(),
            timeframes: vec![TimeframeConfig::default()],
            ict_features: IctFeatures::default(),
            total_features: 1854,
            estimated_memory: "2.4 MB".to_string(),
        }
    }
}

/// Features-level patch; nested values are replaced whole
#[derive(Debug, Clone, Default)]
pub struct FeaturesPatch {
    pub data_source: Option<DataSourceConfig>,
    pub timeframes: Option<Vec<TimeframeConfig>>,
    pub ict_features: Option<IctFeatures>,
    pub total_features: Option<u32>,
    pub estimated_memory: Option<String>,
}

impl FeaturesPatch {
    pub fn apply(self, target: &mut FeatureConfig) {
        let Self {
            data_source,
            timeframes,
            ict_features,
            total_features,
            estimated_memory,
        } = self;

        if let Some(v) = data_source {
            target.data_source = v;
        }
        if let Some(v) = timeframes {
            target.timeframes = v;
        }
        if let Some(v) = ict_features {
            target.ict_features = v;
        }
        if let Some(v) = total_features {
            target.total_features = v;
        }
        if let Some(v) = estimated_memory {
            target.estimated_memory = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub algorithm: Algorithm,
    pub architecture: Architecture,
    pub value_function: ValueFunction,
    pub preset: Preset,
    pub hidden_size: u32,
    pub num_layers: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Ppo,
            architecture: Architecture::Lstm,
            value_function: ValueFunction::Shared,
            preset: Preset::Balanced,
            hidden_size: 256,
            num_layers: 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelPatch {
    pub algorithm: Option<Algorithm>,
    pub architecture: Option<Architecture>,
    pub value_function: Option<ValueFunction>,
    pub preset: Option<Preset>,
    pub hidden_size: Option<u32>,
    pub num_layers: Option<u32>,
}

impl ModelPatch {
    pub fn apply(self, target: &mut ModelConfig) {
        let Self {
            algorithm,
            architecture,
            value_function,
            preset,
            hidden_size,
            num_layers,
        } = self;

        if let Some(v) = algorithm {
            target.algorithm = v;
        }
        if let Some(v) = architecture {
            target.architecture = v;
        }
        if let Some(v) = value_function {
            target.value_function = v;
        }
        if let Some(v) = preset {
            target.preset = v;
        }
        if let Some(v) = hidden_size {
            target.hidden_size = v;
        }
        if let Some(v) = num_layers {
            target.num_layers = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperparametersConfig {
    pub learning_rate: f64,
    pub entropy_coefficient: f64,
    pub discount_factor: f64,
    pub gae_lambda: f64,
    pub clip_ratio: f64,
    pub total_timesteps: u64,
    pub rollout_buffer_size: u64,
    pub batch_size: u64,
    pub epochs_per_update: u32,
    pub update_frequency: u64,
}

impl Default for HyperparametersConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.0003,
            entropy_coefficient: 0.01,
            discount_factor: 0.99,
            gae_lambda: 0.95,
            clip_ratio: 0.2,
            total_timesteps: 500_000,
            rollout_buffer_size: 2048,
            batch_size: 64,
            epochs_per_update: 10,
            update_frequency: 2048,
        }
    }
}

impl HyperparametersConfig {
    /// Overwrite the preset-controlled subset
    pub fn apply_preset(&mut self, preset: Preset) {
        let PresetValues {
            learning_rate,
            entropy_coefficient,
            discount_factor,
            clip_ratio,
        } = preset.values();
        self.learning_rate = learning_rate;
        self.entropy_coefficient = entropy_coefficient;
        self.discount_factor = discount_factor;
        self.clip_ratio = clip_ratio;
    }
}

#[derive(Debug, Clone, Default)]
pub struct HyperparametersPatch {
    pub learning_rate: Option<f64>,
    pub entropy_coefficient: Option<f64>,
    pub discount_factor: Option<f64>,
    pub gae_lambda: Option<f64>,
    pub clip_ratio: Option<f64>,
    pub total_timesteps: Option<u64>,
    pub rollout_buffer_size: Option<u64>,
    pub batch_size: Option<u64>,
    pub epochs_per_update: Option<u32>,
    pub update_frequency: Option<u64>,
}

impl HyperparametersPatch {
    pub fn apply(self, target: &mut HyperparametersConfig) {
        let Self {
            learning_rate,
            entropy_coefficient,
            discount_factor,
            gae_lambda,
            clip_ratio,
            total_timesteps,
            rollout_buffer_size,
            batch_size,
            epochs_per_update,
            update_frequency,
        } = self;

        if let Some(v) = learning_rate {
            target.learning_rate = v;
        }
        if let Some(v) = entropy_coefficient {
            target.entropy_coefficient = v;
        }
        if let Some(v) = discount_factor {
            target.discount_factor = v;
        }
        if let Some(v) = gae_lambda {
            target.gae_lambda = v;
        }
        if let Some(v) = clip_ratio {
            target.clip_ratio = v;
        }
        if let Some(v) = total_timesteps {
            target.total_timesteps = v;
        }
        if let Some(v) = rollout_buffer_size {
            target.rollout_buffer_size = v;
        }
        if let Some(v) = batch_size {
            target.batch_size = v;
        }
        if let Some(v) = epochs_per_update {
            target.epochs_per_update = v;
        }
        if let Some(v) = update_frequency {
            target.update_frequency = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardConfig {
    #[serde(rename = "type")]
    pub function: RewardFunction,
    pub pnl_weight: f64,
    pub sharpe_weight: f64,
    pub turnover_penalty: f64,
    pub reward_clipping: bool,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            function: RewardFunction::PurePnl,
            pnl_weight: 0.6,
            sharpe_weight: 0.3,
            turnover_penalty: 0.1,
            reward_clipping: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardPatch {
    pub function: Option<RewardFunction>,
    pub pnl_weight: Option<f64>,
    pub sharpe_weight: Option<f64>,
    pub turnover_penalty: Option<f64>,
    pub reward_clipping: Option<bool>,
}

impl RewardPatch {
    pub fn apply(self, target: &mut RewardConfig) {
        let Self {
            function,
            pnl_weight,
            sharpe_weight,
            turnover_penalty,
            reward_clipping,
        } = self;

        if let Some(v) = function {
            target.function = v;
        }
        if let Some(v) = pnl_weight {
            target.pnl_weight = v;
        }
        if let Some(v) = sharpe_weight {
            target.sharpe_weight = v;
        }
        if let Some(v) = turnover_penalty {
            target.turnover_penalty = v;
        }
        if let Some(v) = reward_clipping {
            target.reward_clipping = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub normalize_observations: bool,
    pub running_normalization: bool,
    pub reward_normalization: bool,
    pub starting_capital: f64,
    /// Percent of capital
    pub max_position_size: f64,
    pub max_simultaneous_positions: u32,
    /// Percent
    pub slippage: f64,
    /// Percent
    pub taker_fee: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            normalize_observations: true,
            running_normalization: true,
            reward_normalization: true,
            starting_capital: 10000.0,
            max_position_size: 20.0,
            max_simultaneous_positions: 1,
            slippage: 0.05,
            taker_fee: 0.02,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentPatch {
    pub normalize_observations: Option<bool>,
    pub running_normalization: Option<bool>,
    pub reward_normalization: Option<bool>,
    pub starting_capital: Option<f64>,
    pub max_position_size: Option<f64>,
    pub max_simultaneous_positions: Option<u32>,
    pub slippage: Option<f64>,
    pub taker_fee: Option<f64>,
}

impl EnvironmentPatch {
    pub fn apply(self, target: &mut EnvironmentConfig) {
        let Self {
            normalize_observations,
            running_normalization,
            reward_normalization,
            starting_capital,
            max_position_size,
            max_simultaneous_positions,
            slippage,
            taker_fee,
        } = self;

        if let Some(v) = normalize_observations {
            target.normalize_observations = v;
        }
        if let Some(v) = running_normalization {
            target.running_normalization = v;
        }
        if let Some(v) = reward_normalization {
            target.reward_normalization = v;
        }
        if let Some(v) = starting_capital {
            target.starting_capital = v;
        }
        if let Some(v) = max_position_size {
            target.max_position_size = v;
        }
        if let Some(v) = max_simultaneous_positions {
            target.max_simultaneous_positions = v;
        }
        if let Some(v) = slippage {
            target.slippage = v;
        }
        if let Some(v) = taker_fee {
            target.taker_fee = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputeKind {
    H100,
    A100,
    L40S,
    #[serde(rename = "CPU")]
    Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeEnvironment {
    Local,
    Aws,
    Gcp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    pub compute: ComputeKind,
    pub environment: ComputeEnvironment,
    pub multi_environment: bool,
    pub distributed_training: bool,
    pub num_envs: u32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            compute: ComputeKind::H100,
            environment: ComputeEnvironment::Local,
            multi_environment: true,
            distributed_training: false,
            num_envs: 8,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourcePatch {
    pub compute: Option<ComputeKind>,
    pub environment: Option<ComputeEnvironment>,
    pub multi_environment: Option<bool>,
    pub distributed_training: Option<bool>,
    pub num_envs: Option<u32>,
}

impl ResourcePatch {
    pub fn apply(self, target: &mut ResourceConfig) {
        let Self {
            compute,
            environment,
            multi_environment,
            distributed_training,
            num_envs,
        } = self;

        if let Some(v) = compute {
            target.compute = v;
        }
        if let Some(v) = environment {
            target.environment = v;
        }
        if let Some(v) = multi_environment {
            target.multi_environment = v;
        }
        if let Some(v) = distributed_training {
            target.distributed_training = v;
        }
        if let Some(v) = num_envs {
            target.num_envs = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentTarget {
    PaperTestnet,
    PaperSimulated,
    LiveSpot,
    LiveFutures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub target: DeploymentTarget,
    pub exchange: Exchange,
    /// Percent of capital per trade
    pub position_size: f64,
    pub max_simultaneous_trades: u32,
    /// Percent
    pub max_daily_loss: f64,
    /// Percent
    pub max_drawdown: f64,
    pub real_time_monitoring: bool,
    pub emergency_stop: bool,
    pub auto_retraining: bool,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            target: DeploymentTarget::PaperTestnet,
            exchange: Exchange::Binance,
            position_size: 5.0,
            max_simultaneous_trades: 1,
            max_daily_loss: 5.0,
            max_drawdown: 10.0,
            real_time_monitoring: true,
            emergency_stop: true,
            auto_retraining: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeploymentPatch {
    pub target: Option<DeploymentTarget>,
    pub exchange: Option<Exchange>,
    pub position_size: Option<f64>,
    pub max_simultaneous_trades: Option<u32>,
    pub max_daily_loss: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub real_time_monitoring: Option<bool>,
    pub emergency_stop: Option<bool>,
    pub auto_retraining: Option<bool>,
}

impl DeploymentPatch {
    pub fn apply(self, target: &mut DeploymentConfig) {
        let Self {
            target: deployment_target,
            exchange,
            position_size,
            max_simultaneous_trades,
            max_daily_loss,
            max_drawdown,
            real_time_monitoring,
            emergency_stop,
            auto_retraining,
        } = self;

        if let Some(v) = deployment_target {
            target.target = v;
        }
        if let Some(v) = exchange {
            target.exchange = v;
        }
        if let Some(v) = position_size {
            target.position_size = v;
        }
        if let Some(v) = max_simultaneous_trades {
            target.max_simultaneous_trades = v;
        }
        if let Some(v) = max_daily_loss {
            target.max_daily_loss = v;
        }
        if let Some(v) = max_drawdown {
            target.max_drawdown = v;
        }
        if let Some(v) = real_time_monitoring {
            target.real_time_monitoring = v;
        }
        if let Some(v) = emergency_stop {
            target.emergency_stop = v;
        }
        if let Some(v) = auto_retraining {
            target.auto_retraining = v;
        }
    }
}

/// Editable experiment definition (everything except identity and status)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentDraft {
    pub name: String,
    pub description: String,
    pub features: FeatureConfig,
    pub model: ModelConfig,
    pub hyperparameters: HyperparametersConfig,
    pub reward: RewardConfig,
    pub environment: EnvironmentConfig,
    pub resources: ResourceConfig,
    pub deployment: DeploymentConfig,
}

pub const DEFAULT_EXPERIMENT_NAME: &str = "PPO_BTCUSDT_v1";

impl Default for ExperimentDraft {
    fn default() -> Self {
        Self {
            name: DEFAULT_EXPERIMENT_NAME.to_string(),
            description: String::new(),
            features: FeatureConfig::default(),
            model: ModelConfig::default(),
            hyperparameters: HyperparametersConfig::default(),
            reward: RewardConfig::default(),
            environment: EnvironmentConfig::default(),
            resources: ResourceConfig::default(),
            deployment: DeploymentConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentMetrics {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub total_trades: u64,
}

/// A saved experiment definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub status: ExperimentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub config: ExperimentDraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ExperimentMetrics>,
}

/// Dashboard row for one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSummary {
    pub id: String,
    pub name: String,
    pub symbol: MarketSymbol,
    pub algorithm: Algorithm,
    pub status: ExperimentStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_return: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl ExperimentSummary {
    /// The fixed list shown on the home dashboard
    pub fn demo_list() -> Vec<ExperimentSummary> {
        let row = |id: &str,
                   name: &str,
                   symbol: MarketSymbol,
                   algorithm: Algorithm,
                   status: ExperimentStatus,
                   created_at: &str| ExperimentSummary {
            id: id.to_string(),
            name: name.to_string(),
            symbol,
            algorithm,
            status,
            created_at: created_at.to_string(),
            total_return: None,
            sharpe_ratio: None,
            progress: None,
        };

        vec![
            ExperimentSummary {
                total_return: Some(12.5),
                sharpe_ratio: Some(1.45),
                ..row("exp-001", "PPO_BTCUSDT_v1", MarketSymbol::BtcUsdt, Algorithm::Ppo, ExperimentStatus::Completed, "2025-12-15T10:30:00Z")
            },
            ExperimentSummary {
                progress: Some(75.0),
                ..row("exp-002", "DQN_ETHUSDT_ICT", MarketSymbol::EthUsdt, Algorithm::Dqn, ExperimentStatus::Training, "2025-12-18T14:20:00Z")
            },
            ExperimentSummary {
                total_return: Some(-3.2),
                sharpe_ratio: Some(0.85),
                ..row("exp-003", "SAC_BTCUSDT_MultiTF", MarketSymbol::BtcUsdt, Algorithm::Sac, ExperimentStatus::Completed, "2025-12-10T08:15:00Z")
            },
            ExperimentSummary {
                total_return: Some(18.7),
                sharpe_ratio: Some(1.92),
                ..row("exp-004", "PPO_SOLUSDT_Aggressive", MarketSymbol::SolUsdt, Algorithm::Ppo, ExperimentStatus::Deployed, "2025-12-01T16:45:00Z")
            },
            row("exp-005", "TRPO_BNBUSDT_Conservative", MarketSymbol::BnbUsdt, Algorithm::Trpo, ExperimentStatus::Failed, "2025-12-12T09:00:00Z"),
            ExperimentSummary {
                progress: Some(42.0),
                ..row("exp-006", "A3C_BTCUSDT_HighFreq", MarketSymbol::BtcUsdt, Algorithm::A3c, ExperimentStatus::Training, "2025-12-19T06:30:00Z")
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_values() {
        let mut hp = HyperparametersConfig::default();
        hp.apply_preset(Preset::Aggressive);
        assert_eq!(hp.learning_rate, 0.001);
        assert_eq!(hp.entropy_coefficient, 0.05);
        assert_eq!(hp.discount_factor, 0.95);
        assert_eq!(hp.clip_ratio, 0.3);
        // Outside the preset subset
        assert_eq!(hp.batch_size, 64);
    }

    #[test]
    fn test_patch_merges_shallowly() {
        let mut reward = RewardConfig::default();
        RewardPatch {
            function: Some(RewardFunction::SharpeBased),
            ..Default::default()
        }
        .apply(&mut reward);
        assert_eq!(reward.function, RewardFunction::SharpeBased);
        assert_eq!(reward.pnl_weight, 0.6);
        assert!(reward.reward_clipping);
    }

    #[test]
    fn test_serde_names_match_wire_format() {
        let json = serde_json::to_value(ModelConfig::default()).unwrap();
        assert_eq!(json["algorithm"], "PPO");
        assert_eq!(json["architecture"], "LSTM");
        assert_eq!(json["valueFunction"], "shared");

        let json = serde_json::to_value(DataSourceConfig::default()).unwrap();
        assert_eq!(json["symbol"], "BTCUSDT");
        assert_eq!(json["baseTimeframe"], "1h");

        let json = serde_json::to_value(RewardConfig::default()).unwrap();
        assert_eq!(json["type"], "pure_pnl");
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(Preset::try_from("Conservative").unwrap(), Preset::Conservative);
        assert!(Preset::try_from("reckless").is_err());
    }

    #[test]
    fn test_demo_list_has_six_rows() {
        let rows = ExperimentSummary::demo_list();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[1].progress, Some(75.0));
        assert_eq!(rows[4].status, ExperimentStatus::Failed);
    }
}
