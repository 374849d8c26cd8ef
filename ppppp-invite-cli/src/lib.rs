//! ppppp invite CLI
//!
//! Library half of the `ppppp-invite` binary, split out so the command
//! implementations can be exercised from integration tests.

pub mod commands;
pub mod config;
pub mod ui;
