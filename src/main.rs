use clap::Parser;
use rlboard::cli::commands::{self, BacktestArgs, TrainArgs};
use rlboard::cli::output::{self, OutputMode};
use rlboard::cli::{Cli, Commands};
use rlboard::config::AppConfig;
use rlboard::domain::TradeFilter;
use rlboard::error::{BoardError, Result};
use tracing::debug;

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mode = OutputMode::from_json_flag(cli.json);

    let config = match AppConfig::load_from(&cli.config_dir) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Failed to load config from {}: {e}", cli.config_dir));
            return Err(BoardError::Config(e));
        }
    };
    if let Err(problems) = config.validate() {
        for problem in &problems {
            output::print_error(problem);
        }
        return Err(BoardError::Validation(problems.join("; ")));
    }

    match cli.command {
        Commands::Train {
            max_ticks,
            total_steps,
            tick_ms,
            fresh,
        } => {
            init_logging(&config.logging);
            debug!(?max_ticks, ?total_steps, ?tick_ms, fresh, "train");
            commands::train(
                &config,
                TrainArgs {
                    max_ticks,
                    total_steps,
                    tick_ms,
                    fresh,
                },
                mode,
            )
            .await?;
        }
        Commands::Stream { ticks, tick_ms } => {
            init_logging_simple(&config.logging);
            commands::stream(&config, ticks, tick_ms, mode).await?;
        }
        Commands::Live { seconds } => {
            init_logging(&config.logging);
            commands::live(&config, seconds, mode).await?;
        }
        Commands::Backtest {
            experiment_id,
            experiment_name,
            action,
            winners,
            losers,
            limit,
            year,
        } => {
            init_logging_simple(&config.logging);
            let pnl_positive = match (winners, losers) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::backtest(
                &config,
                BacktestArgs {
                    experiment_id,
                    experiment_name,
                    filter: TradeFilter {
                        action: action.map(Into::into),
                        pnl_positive,
                    },
                    limit,
                    year,
                },
                mode,
            )
            .await?;
        }
        Commands::Config(cmd) => {
            init_logging_simple(&config.logging);
            commands::config_command(&config, cmd, mode)?;
        }
        Commands::Prefs(cmd) => {
            init_logging_simple(&config.logging);
            commands::prefs_command(&config, cmd, mode)?;
        }
    }

    Ok(())
}
