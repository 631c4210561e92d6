//! Text Tester command-line front end.
//!
//! Exposes the CLI modules for integration testing.

pub mod cli;
pub mod config;

pub use config::{AppSettings, ExecutionConfig};
