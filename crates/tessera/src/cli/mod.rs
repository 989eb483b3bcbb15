//! Command handlers for the `tessera` binary.

pub mod config;
pub mod process;
