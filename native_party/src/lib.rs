pub mod catalog;
pub mod cli;
pub mod config;
pub mod party;
pub mod pretty;
pub mod server;
pub mod transport;
