//! Timer-driven simulators that feed the stores

pub mod live_feed;
pub mod price_stream;
pub mod ticker;
pub mod training;

pub use live_feed::{demo_position, LiveFeed, LiveSessionState, SessionStatus};
pub use price_stream::{PricePoint, PriceStream, PriceStreamState};
pub use ticker::{TickControl, Ticker};
pub use training::{advance, TrainingSimulator};
