pub mod config;
pub mod digest;
pub mod error;
pub mod personalization;
pub mod telemetry;
