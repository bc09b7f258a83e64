//! Subcommand implementations.
//!
//! Each command runs one engine operation and prints the affected part of
//! the store as pretty JSON on stdout. Logs go to stderr.

pub mod cart;
pub mod orders;
pub mod wishlist;

use serde::Serialize;
use shopease_core::QuantityError;
use shopease_storefront::{HttpResourceClient, SyncController};
use thiserror::Error;

/// The engine as wired by the CLI.
pub type Engine = SyncController<HttpResourceClient>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The engine reported failure; details were logged.
    #[error("{0} failed, see log for details")]
    Failed(&'static str),

    /// Quantity argument out of range.
    #[error("Invalid quantity: {0}")]
    Quantity(#[from] QuantityError),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Turn an engine success flag into a result.
const fn ensure(ok: bool, operation: &'static str) -> Result<(), CommandError> {
    if ok {
        Ok(())
    } else {
        Err(CommandError::Failed(operation))
    }
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
