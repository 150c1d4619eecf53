//! Protocol layer for device communication.
//!
//! Builds the newline-terminated command tokens a device understands.

pub mod commands;

pub use commands::Command;
