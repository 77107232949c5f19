//! rlboard command line
//!
//! Commands:
//! - `rlboard train` - Run the training simulator and print progress
//! - `rlboard stream` - Print simulated price ticks
//! - `rlboard live` - Follow the simulated live session
//! - `rlboard backtest` - Run a mock backtest and print the report
//! - `rlboard config` - Experiment configuration (draft, presets, saved configs)
//! - `rlboard prefs` - Persisted UI preferences

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::{Preset, TradeAction, DEFAULT_EXPERIMENT_NAME};

/// RL trading experiment dashboard (headless)
#[derive(Parser, Debug)]
#[command(name = "rlboard")]
#[command(author, version, about = "Simulated RL trading experiment dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding default.toml
    #[arg(short, long, default_value = "config", env = "RLBOARD_CONFIG_DIR")]
    pub config_dir: String,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the training simulator until the job completes
    Train {
        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,
        /// Override the job's total steps
        #[arg(long)]
        total_steps: Option<u64>,
        /// Override the tick interval
        #[arg(long)]
        tick_ms: Option<u64>,
        /// Start a fresh job instead of the demo run
        #[arg(long)]
        fresh: bool,
    },
    /// Print simulated price ticks
    Stream {
        /// Number of ticks to print
        #[arg(short = 'n', long, default_value = "10")]
        ticks: u64,
        /// Override the tick interval
        #[arg(long)]
        tick_ms: Option<u64>,
    },
    /// Follow the simulated live session for a while
    Live {
        #[arg(long, default_value = "30")]
        seconds: u64,
    },
    /// Run a mock backtest and print metrics and trades
    Backtest {
        #[arg(long, default_value = "exp-001")]
        experiment_id: String,
        #[arg(long, default_value = DEFAULT_EXPERIMENT_NAME)]
        experiment_name: String,
        /// Only trades with this action
        #[arg(long, value_enum)]
        action: Option<ActionArg>,
        /// Only winning trades
        #[arg(long, conflicts_with = "losers")]
        winners: bool,
        /// Only losing trades
        #[arg(long)]
        losers: bool,
        /// Number of trades to list
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Show monthly returns for this year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Experiment configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Persisted preferences
    #[command(subcommand)]
    Prefs(PrefsCommands),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the current draft
    Show,
    /// Apply a hyperparameter preset to the draft
    Preset {
        #[arg(value_enum)]
        preset: PresetArg,
        /// Save the resulting config
        #[arg(long)]
        save: bool,
    },
    /// Reset the draft to defaults
    Reset,
    /// Save the draft as a new experiment config
    Save {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List saved configs
    List,
    /// Delete a saved config
    Remove { id: String },
    /// List the demo experiments
    Experiments,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PrefsCommands {
    /// Show persisted preferences
    Show,
    /// Toggle dark mode
    DarkMode,
    /// Toggle the collapsed sidebar
    Sidebar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    Aggressive,
    Balanced,
    Conservative,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Aggressive => Preset::Aggressive,
            PresetArg::Balanced => Preset::Balanced,
            PresetArg::Conservative => Preset::Conservative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Buy,
    Sell,
    Short,
    Cover,
}

impl From<ActionArg> for TradeAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Buy => TradeAction::Buy,
            ActionArg::Sell => TradeAction::Sell,
            ActionArg::Short => TradeAction::Short,
            ActionArg::Cover => TradeAction::Cover,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backtest_filters() {
        let cli = Cli::parse_from(["rlboard", "backtest", "--action", "short", "--winners", "--year", "2025"]);
        match cli.command {
            Commands::Backtest { action, winners, losers, year, .. } => {
                assert_eq!(action.map(TradeAction::from), Some(TradeAction::Short));
                assert!(winners);
                assert!(!losers);
                assert_eq!(year, Some(2025));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_winners_and_losers_conflict() {
        assert!(Cli::try_parse_from(["rlboard", "backtest", "--winners", "--losers"]).is_err());
    }

    #[test]
    fn test_parse_config_preset() {
        let cli = Cli::parse_from(["rlboard", "--json", "config", "preset", "aggressive", "--save"]);
        assert!(cli.json);
        match cli.command {
            Commands::Config(ConfigCommands::Preset { preset, save }) => {
                assert_eq!(Preset::from(preset), Preset::Aggressive);
                assert!(save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
