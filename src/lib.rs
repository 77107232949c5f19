//! Core of a simulated RL trading experiment dashboard.
//!
//! Observable stores hold experiment drafts, the running training job and
//! backtest reports. Timer-driven simulators feed them synthetic data so a
//! front end (or the bundled CLI) can render a live-looking session without
//! any real training or market connection.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod format;
pub mod mock;
pub mod persistence;
pub mod simulator;
pub mod store;

pub use config::AppConfig;
pub use error::{BoardError, Result};
pub use persistence::{FileStorage, LocalStorage, MemoryStorage};
pub use simulator::{LiveFeed, PriceStream, TickControl, Ticker, TrainingSimulator};
pub use store::{BacktestStore, ExperimentStore, Store, Subscription, TrainingStore};
