//! dlwatch - follow server-driven download jobs from the terminal

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod monitor;
pub mod transport;
pub mod tui;
