//! Command-line interface support
//!
//! Argument structs and handlers used by the `message-etl` binary.

pub mod commands;
pub mod error;
