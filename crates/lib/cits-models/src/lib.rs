#![forbid(unsafe_code)]

pub mod dispatch;
pub mod fleet;
pub mod geonet;
pub mod kinematics;
