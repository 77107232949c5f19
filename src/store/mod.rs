//! State stores
//!
//! Each store exclusively owns its slice of state behind an observable
//! container. Stores are cheap handles; the composition root creates one of
//! each and hands clones to simulators and views.

pub mod backtest;
pub mod experiment;
pub mod observable;
pub mod training;

pub use backtest::{BacktestState, BacktestStore};
pub use experiment::{ExperimentState, ExperimentStore, PersistedPreferences};
pub use observable::{Store, Subscription};
pub use training::{demo_training_state, TrainingStore};
