//! CLI command implementations.

pub mod display_server;
pub mod log;
pub mod shutdown;
pub mod update;
pub mod zero;
