//! # Optica
//!
//! Entry point for the `optica` binary. All logic lives in the library crate.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    optica_cli::run().await
}
