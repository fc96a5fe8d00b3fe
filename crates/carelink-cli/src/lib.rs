//! Library half of the `carelink` binary: argument definitions,
//! configuration loading, logging setup and command implementations.

pub mod cli;
pub mod commands;
pub mod config;
pub mod observability;
pub mod output;
