//! # credstore-cli
//!
//! Terminal front end for the discovery credential list. Plays the part of
//! the presentation layer: commands are translated into panel selections and
//! form answers against a [`credstore_core::CredentialStore`].

pub mod commands;
mod error;

pub use commands::{execute, Command, CommandOutput};
pub use error::{CliError, Result};
