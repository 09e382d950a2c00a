//! Command-line interface
//!
//! Argument parsing for starting a node and creating wallets.

pub mod commands;

pub use commands::{Command, Opt};
