#![forbid(unsafe_code)]

pub use hashbrown;

pub mod cell;
pub mod message;
pub mod mobility;
pub mod node;
pub mod pipeline;
pub mod time;
pub mod transport;
