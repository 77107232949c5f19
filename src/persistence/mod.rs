//! Durable local persistence
//!
//! Only UI preferences and saved experiment configurations survive a
//! restart; everything else is session state.

pub mod local_storage;

pub use local_storage::{load_json, store_json, FileStorage, LocalStorage, MemoryStorage};
