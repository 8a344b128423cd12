pub mod application;
pub mod facilities;
pub mod link;
pub mod network;
pub mod vehicle;
