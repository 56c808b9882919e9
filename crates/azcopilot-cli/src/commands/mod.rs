//! Command implementations for the azcopilot CLI.

pub mod config;
pub mod render;
pub mod repl;
pub mod run;
pub mod session;
