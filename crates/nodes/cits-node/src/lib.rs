#![forbid(unsafe_code)]

pub mod logger;
pub mod node;
pub mod stack;
pub mod transport;
