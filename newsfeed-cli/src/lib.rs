//! # newsfeed-cli
//!
//! Entry-point support for the `newsfeed` binary: argument parsing ([`Cli`]), the validated
//! [`RunConfig`], the line-oriented [`ConsoleTransport`] and [`run`], which wires the store,
//! the controller and the dispatcher together and runs them until shutdown.

pub mod cli;
pub mod config;
pub mod console;
pub mod run;

pub use cli::{Cli, Commands, RunArgs};
pub use config::RunConfig;
pub use console::{read_requests, ConsoleTransport};
pub use run::{run, UnconfiguredArticles};
