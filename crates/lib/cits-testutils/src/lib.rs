#![forbid(unsafe_code)]

pub mod report;
pub mod transport;
