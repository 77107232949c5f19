pub mod experiment;
pub mod ring_buffer;
pub mod trading;
pub mod training;

pub use experiment::*;
pub use ring_buffer::RingBuffer;
pub use trading::*;
pub use training::*;
