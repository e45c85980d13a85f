#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod admin;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod report;
pub mod server;
pub mod state;
pub mod system;
pub mod telegram;
pub mod telemetry;
pub mod types;

pub type Result<T> = std::result::Result<T, error::Error>;
