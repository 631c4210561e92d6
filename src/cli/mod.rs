pub mod app;
pub mod changed;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod info;
pub mod output;
pub mod parse;
pub mod run;
pub mod runtime;
pub mod translate;
pub mod watch;

pub use context::CliContext;
pub use env::CliArgs;
