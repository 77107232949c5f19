//! Command handlers
//!
//! Each handler is a small composition root: it builds the stores and
//! simulators it needs from `AppConfig`, drives them, and prints.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};

use super::output::{self, OutputMode};
use super::{ConfigCommands, PrefsCommands};
use crate::config::AppConfig;
use crate::domain::{
    BacktestMetrics, Experiment, ExperimentDraft, ExperimentSummary, LiveTrade, MonthlyReturn,
    ProgressPatch, Trade, TradeFilter, TrainingState, TrainingStatus,
};
use crate::error::{BoardError, Result};
use crate::format;
use crate::persistence::FileStorage;
use crate::simulator::{LiveFeed, PriceStream, TrainingSimulator};
use crate::store::{BacktestState, BacktestStore, ExperimentStore, TrainingStore};

// ---------------------------------------------------------------------------
// train
// ---------------------------------------------------------------------------

pub struct TrainArgs {
    pub max_ticks: Option<u64>,
    pub total_steps: Option<u64>,
    pub tick_ms: Option<u64>,
    pub fresh: bool,
}

pub async fn train(config: &AppConfig, args: TrainArgs, mode: OutputMode) -> Result<()> {
    let mut sim_config = config.training.clone();
    if let Some(ms) = args.tick_ms {
        sim_config.tick_interval_ms = ms;
    }
    let stride = sim_config.step_stride.max(1);

    let store = TrainingStore::demo(&sim_config);
    if args.fresh {
        let (id, name) = store.read(|s| (s.experiment_id.clone(), s.experiment_name.clone()));
        store.start_training(&id, &name);
    }
    if let Some(total) = args.total_steps {
        store.update_progress(ProgressPatch {
            total_steps: Some(total),
            ..ProgressPatch::default()
        });
    }

    let start_step = store.read(|s| s.progress.current_step);
    let mut rx = store.store().watch();
    let simulator = TrainingSimulator::new(store.clone(), sim_config);
    if !simulator.attach() {
        simulator.start();
    }

    if !mode.is_json() {
        let s = store.snapshot();
        output::print_header(&format!("Training {} ({})", s.experiment_name, s.experiment_id));
    }

    let mut last_step = start_step;
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = rx.borrow_and_update().clone();
                if s.progress.current_step != last_step {
                    last_step = s.progress.current_step;
                    if !mode.is_json() {
                        println!("{}", progress_line(&s));
                    }
                }
                let ticks = (last_step.saturating_sub(start_step)) / stride;
                if s.status != TrainingStatus::Running {
                    break;
                }
                if args.max_ticks.is_some_and(|max| ticks >= max) {
                    info!(ticks, "Tick limit reached");
                    store.pause_training();
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                store.stop_training();
                break;
            }
        }
    }
    simulator.detach();

    let s = store.snapshot();
    if mode.is_json() {
        return output::print_item(&TrainingSummary::from(&s));
    }

    output::print_header("Summary");
    output::print_kv("Status", s.status);
    output::print_kv("Progress", format::percent(s.progress.progress, 1, false));
    output::print_kv(
        "Steps",
        format!(
            "{} / {}",
            format::compact_number(s.progress.current_step as f64, 1),
            format::compact_number(s.progress.total_steps as f64, 1)
        ),
    );
    let elapsed = format::human_duration(s.progress.elapsed_time);
    output::print_kv("Elapsed", if elapsed.is_empty() { "-".to_string() } else { elapsed });
    output::print_kv("Curve points", s.learning_curve.len());
    output::print_kv(
        "Cumulative PnL",
        output::toned(
            &format::currency(s.trade_performance.cumulative_pnl, 2),
            s.trade_performance.cumulative_pnl,
        ),
    );
    output::print_kv("Sharpe", format::ratio(s.trade_performance.sharpe_ratio));

    output::print_header("Recent logs");
    for log in s.logs.iter().take(8) {
        println!("{} [{:>5}] {}", format::log_time(log.timestamp), log.level.as_str(), log.message);
    }
    Ok(())
}

fn progress_line(s: &TrainingState) -> String {
    let reward = s.last_curve_point().map_or(0.0, |p| p.train_return);
    format!(
        "[{:>6}] step {:>8}  eta {:>8}  reward {:>7.2}  gpu {:>3.0}%  equity {}",
        format::percent(s.progress.progress, 1, false),
        format::compact_number(s.progress.current_step as f64, 1),
        format::short_duration(s.progress.eta),
        reward,
        s.progress.gpu_util,
        format::percent(s.current_episode.equity_change, 2, true),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainingSummary {
    experiment_id: String,
    status: TrainingStatus,
    progress: f64,
    current_step: u64,
    total_steps: u64,
    elapsed_time: f64,
    curve_points: usize,
    cumulative_pnl: f64,
    sharpe_ratio: f64,
}

impl From<&TrainingState> for TrainingSummary {
    fn from(s: &TrainingState) -> Self {
        Self {
            experiment_id: s.experiment_id.clone(),
            status: s.status,
            progress: s.progress.progress,
            current_step: s.progress.current_step,
            total_steps: s.progress.total_steps,
            elapsed_time: s.progress.elapsed_time,
            curve_points: s.learning_curve.len(),
            cumulative_pnl: s.trade_performance.cumulative_pnl,
            sharpe_ratio: s.trade_performance.sharpe_ratio,
        }
    }
}

// ---------------------------------------------------------------------------
// stream / live
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Tabled)]
struct TickRow {
    time: String,
    price: String,
    change: String,
    #[serde(rename = "changePercent")]
    #[tabled(rename = "change %")]
    change_percent: String,
}

pub async fn stream(config: &AppConfig, ticks: u64, tick_ms: Option<u64>, mode: OutputMode) -> Result<()> {
    let mut stream_config = config.price_stream.clone();
    if let Some(ms) = tick_ms {
        stream_config.tick_interval_ms = ms;
    }

    let stream = PriceStream::new(stream_config);
    let mut rx = stream.store().watch();
    let mut last_ts = rx.borrow().price_history.back().map(|p| p.timestamp);
    stream.connect();

    let mut rows = Vec::new();
    while (rows.len() as u64) < ticks {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = rx.borrow_and_update().clone();
                let Some(point) = s.price_history.back().copied() else { continue };
                if Some(point.timestamp) == last_ts {
                    continue;
                }
                last_ts = Some(point.timestamp);

                let row = TickRow {
                    time: format::log_time(point.timestamp),
                    price: format::price(point.price, "$"),
                    change: format!("{:+.2}", s.price_change),
                    change_percent: format::percent(s.price_change_percent, 2, true),
                };
                if !mode.is_json() {
                    println!(
                        "{}  {:>12}  {:>9}  {}",
                        row.time,
                        row.price,
                        output::toned(&row.change, s.price_change),
                        row.change_percent
                    );
                }
                rows.push(row);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    stream.disconnect();

    if mode.is_json() {
        output::print_items(&rows, mode)?;
    }
    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
struct LiveTradeRow {
    time: String,
    action: String,
    price: String,
    size: String,
    pnl: String,
    open: bool,
}

impl From<&LiveTrade> for LiveTradeRow {
    fn from(t: &LiveTrade) -> Self {
        Self {
            time: t.timestamp.clone(),
            action: format!("{:?}", t.action).to_uppercase(),
            price: format::price(t.price, "$"),
            size: format!("{:.3}", t.size),
            pnl: format::currency(t.pnl, 2),
            open: t.is_open,
        }
    }
}

pub async fn live(config: &AppConfig, seconds: u64, mode: OutputMode) -> Result<()> {
    let stream = PriceStream::new(config.price_stream.clone());
    let feed = LiveFeed::new(config.live_feed.clone(), stream.store().clone());

    let mut rx = feed.store().watch();
    let mut last_alert: Option<String> = None;
    stream.connect();
    feed.connect();

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = rx.borrow_and_update().clone();
                if mode.is_json() {
                    continue;
                }
                let newest = s.alerts.front().map(|a| a.id.clone());
                if newest != last_alert {
                    let fresh: Vec<_> = s
                        .alerts
                        .iter()
                        .take_while(|a| Some(&a.id) != last_alert.as_ref())
                        .collect();
                    for alert in fresh.into_iter().rev() {
                        println!("{} [{:?}] {}", alert.timestamp, alert.kind, alert.message);
                    }
                    last_alert = newest;
                }
            }
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    feed.pause();
    stream.disconnect();

    let s = feed.snapshot();
    if mode.is_json() {
        return output::print_item(&s);
    }

    output::print_header("Position");
    let p = &s.position;
    output::print_kv("Symbol", &p.symbol);
    output::print_kv("Side", format!("{:?}", p.side).to_lowercase());
    output::print_kv("Entry", format::price(p.entry_price, "$"));
    output::print_kv("Mark", format::price(p.current_price, "$"));
    output::print_kv(
        "Unrealized PnL",
        output::toned(
            &format!(
                "{} ({})",
                format::currency(p.unrealized_pnl, 2),
                format::percent(p.unrealized_pnl_percent, 2, true)
            ),
            p.unrealized_pnl,
        ),
    );

    output::print_header("Recent trades");
    let rows: Vec<LiveTradeRow> = s.recent_trades.iter().map(LiveTradeRow::from).collect();
    output::print_items(&rows, mode)
}

// ---------------------------------------------------------------------------
// backtest
// ---------------------------------------------------------------------------

pub struct BacktestArgs {
    pub experiment_id: String,
    pub experiment_name: String,
    pub filter: TradeFilter,
    pub limit: usize,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, Tabled)]
struct MetricRow {
    metric: &'static str,
    model: String,
    benchmark: String,
}

fn metric_rows(m: &BacktestMetrics, b: &BacktestMetrics) -> Vec<MetricRow> {
    let row = |metric, model: String, benchmark: String| MetricRow {
        metric,
        model,
        benchmark,
    };
    vec![
        row("Total return", format::currency(m.total_return, 2), format::currency(b.total_return, 2)),
        row(
            "Total return %",
            format::percent(m.total_return_percent, 2, true),
            format::percent(b.total_return_percent, 2, true),
        ),
        row(
            "Annual return %",
            format::percent(m.annual_return, 2, true),
            format::percent(b.annual_return, 2, true),
        ),
        row("Sharpe", format::ratio(m.sharpe_ratio), format::ratio(b.sharpe_ratio)),
        row("Sortino", format::ratio(m.sortino_ratio), format::ratio(b.sortino_ratio)),
        row(
            "Max drawdown %",
            format::percent(m.max_drawdown_percent, 2, false),
            format::percent(b.max_drawdown_percent, 2, false),
        ),
        row("Win rate", format::percent(m.win_rate, 1, false), format::percent(b.win_rate, 1, false)),
        row("Profit factor", format::ratio(m.profit_factor), format::ratio(b.profit_factor)),
        row("Trades", m.total_trades.to_string(), b.total_trades.to_string()),
        row("Avg hold", format::minutes(m.avg_hold_time), format::minutes(b.avg_hold_time)),
    ]
}

#[derive(Debug, Serialize, Tabled)]
struct TradeRow {
    id: u64,
    entry: String,
    action: String,
    #[tabled(rename = "entry price")]
    entry_price: String,
    #[tabled(rename = "exit price")]
    exit_price: String,
    held: String,
    pnl: String,
    #[tabled(rename = "pnl %")]
    pnl_percent: String,
}

impl From<&Trade> for TradeRow {
    fn from(t: &Trade) -> Self {
        Self {
            id: t.id,
            entry: t.entry_time.clone(),
            action: t.action.to_string(),
            entry_price: format::price(t.entry_price, "$"),
            exit_price: format::price(t.exit_price, "$"),
            held: format::minutes(t.duration as f64),
            pnl: format::currency(t.pnl, 2),
            pnl_percent: format::percent(t.pnl_percent, 2, true),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct MonthRow {
    month: String,
    #[serde(rename = "return")]
    #[tabled(rename = "return")]
    return_pct: String,
}

impl From<&MonthlyReturn> for MonthRow {
    fn from(m: &MonthlyReturn) -> Self {
        Self {
            month: format!("{}-{:02}", m.year, m.month),
            return_pct: format::percent(m.return_pct, 2, true),
        }
    }
}

pub async fn backtest(config: &AppConfig, args: BacktestArgs, mode: OutputMode) -> Result<()> {
    let store = BacktestStore::new(
        BacktestState {
            result: None,
            is_loading: false,
            error: None,
        },
        &config.backtest,
    );

    if !mode.is_json() {
        println!("Running backtest for {} ...", args.experiment_name);
    }
    store
        .run_backtest(&args.experiment_id, &args.experiment_name)
        .await
        .map_err(|e| BoardError::Internal(format!("backtest task failed: {e}")))?;

    let Some(result) = store.snapshot().result else {
        return Err(BoardError::Internal("backtest produced no report".to_string()));
    };
    if mode.is_json() {
        return output::print_item(&result);
    }

    output::print_header(&format!(
        "{} / {}  ({} to {})",
        result.experiment_name, result.checkpoint_id, result.start_date, result.end_date
    ));
    output::print_items(&metric_rows(&result.metrics, &result.benchmark_metrics), mode)?;

    if let Some(stats) = store.summary_stats() {
        output::print_kv("Return vs benchmark", format::percent(stats.return_vs_benchmark, 2, true));
        output::print_kv("Sharpe vs benchmark", format!("{:+.2}", stats.sharpe_vs_benchmark));
        output::print_kv("Drawdown improvement", format::percent(stats.drawdown_improvement, 2, true));
        if stats.outperformed {
            output::print_success("Model outperformed the benchmark");
        } else {
            output::print_warn("Model underperformed the benchmark");
        }
    }

    if let Some(year) = args.year {
        output::print_header(&format!("Monthly returns {year}"));
        let rows: Vec<MonthRow> = store.monthly_returns_for_year(year).iter().map(MonthRow::from).collect();
        output::print_items(&rows, mode)?;
    }

    let trades = store.filtered_trades(args.filter);
    output::print_header(&format!("Trades ({} matching)", trades.len()));
    let rows: Vec<TradeRow> = trades.iter().take(args.limit).map(TradeRow::from).collect();
    output::print_items(&rows, mode)
}

// ---------------------------------------------------------------------------
// config / prefs
// ---------------------------------------------------------------------------

fn open_experiment_store(config: &AppConfig) -> ExperimentStore {
    let path = config.storage.resolved_path();
    info!(path = %path.display(), "Using local storage");
    ExperimentStore::new(Arc::new(FileStorage::new(path)), config.storage.namespace.clone())
}

#[derive(Debug, Serialize, Tabled)]
struct SavedConfigRow {
    id: String,
    name: String,
    algorithm: String,
    preset: String,
    status: String,
    created: String,
}

impl From<&Experiment> for SavedConfigRow {
    fn from(e: &Experiment) -> Self {
        Self {
            id: e.id.clone(),
            name: e.config.name.clone(),
            algorithm: e.config.model.algorithm.to_string(),
            preset: e.config.model.preset.to_string(),
            status: e.status.to_string(),
            created: format::date(&e.created_at),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct ExperimentRow {
    id: String,
    name: String,
    symbol: String,
    algorithm: String,
    status: String,
    #[tabled(rename = "return")]
    total_return: String,
    sharpe: String,
}

impl From<&ExperimentSummary> for ExperimentRow {
    fn from(e: &ExperimentSummary) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            symbol: e.symbol.to_string(),
            algorithm: e.algorithm.to_string(),
            status: e.status.to_string(),
            total_return: e
                .total_return
                .map(|r| format::percent(r, 1, true))
                .unwrap_or_else(|| "-".to_string()),
            sharpe: e.sharpe_ratio.map(format::ratio).unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn print_draft(draft: &ExperimentDraft, mode: OutputMode) -> Result<()> {
    if mode.is_json() {
        return output::print_item(draft);
    }
    let hp = &draft.hyperparameters;
    output::print_header(&draft.name);
    output::print_kv("Algorithm", draft.model.algorithm);
    output::print_kv("Preset", draft.model.preset);
    output::print_kv("Learning rate", format::scientific(hp.learning_rate));
    output::print_kv("Entropy coefficient", hp.entropy_coefficient);
    output::print_kv("Discount factor", hp.discount_factor);
    output::print_kv("Clip ratio", hp.clip_ratio);
    output::print_kv("Total timesteps", format::compact_number(hp.total_timesteps as f64, 1));
    output::print_kv("Estimated time", format::estimate_training_time(hp.total_timesteps, 1500.0));
    output::print_kv("History covered", format::timesteps_to_date_range(hp.total_timesteps, 1));
    output::print_kv("Timeframes", draft.features.timeframes.len());
    Ok(())
}

pub fn config_command(config: &AppConfig, cmd: ConfigCommands, mode: OutputMode) -> Result<()> {
    let store = open_experiment_store(config);

    match cmd {
        ConfigCommands::Show => print_draft(&store.experiment_config(), mode),
        ConfigCommands::Preset { preset, save } => {
            store.apply_preset(preset.into());
            print_draft(&store.experiment_config(), mode)?;
            if save {
                let saved = store.save_current_config();
                output::print_success(&format!("Saved {} as {}", saved.config.name, saved.id));
            }
            Ok(())
        }
        ConfigCommands::Reset => {
            store.reset_wizard();
            print_draft(&store.experiment_config(), mode)
        }
        ConfigCommands::Save { name, description } => {
            if let Some(name) = name {
                store.set_experiment_name(name);
            }
            if let Some(description) = description {
                store.set_experiment_description(description);
            }
            let saved = store.save_current_config();
            if mode.is_json() {
                return output::print_item(&saved);
            }
            output::print_success(&format!("Saved {} as {}", saved.config.name, saved.id));
            Ok(())
        }
        ConfigCommands::List => {
            let rows: Vec<SavedConfigRow> =
                store.snapshot().saved_configs.iter().map(SavedConfigRow::from).collect();
            output::print_items(&rows, mode)
        }
        ConfigCommands::Remove { id } => {
            if store.remove_saved_config(&id) {
                output::print_success(&format!("Removed {id}"));
            } else {
                output::print_warn(&format!("No saved config with id {id}"));
            }
            Ok(())
        }
        ConfigCommands::Experiments => {
            let rows: Vec<ExperimentRow> = store.experiments().iter().map(ExperimentRow::from).collect();
            output::print_items(&rows, mode)
        }
    }
}

pub fn prefs_command(config: &AppConfig, cmd: PrefsCommands, mode: OutputMode) -> Result<()> {
    let store = open_experiment_store(config);

    match cmd {
        PrefsCommands::Show => {}
        PrefsCommands::DarkMode => {
            store.toggle_dark_mode();
        }
        PrefsCommands::Sidebar => {
            store.toggle_sidebar();
        }
    }

    let s = store.snapshot();
    if mode.is_json() {
        return output::print_item(&serde_json::json!({
            "isDarkMode": s.is_dark_mode,
            "sidebarCollapsed": s.sidebar_collapsed,
            "savedConfigs": s.saved_configs.len(),
        }));
    }
    output::print_kv("Dark mode", s.is_dark_mode);
    output::print_kv("Sidebar collapsed", s.sidebar_collapsed);
    output::print_kv("Saved configs", s.saved_configs.len());
    Ok(())
}
