//! Entry point for the `latchkey` binary.
//!
//! Exit status: 0 when the operation succeeded, 1 when the lock protocol
//! refused it (not acquired, not owner, unlocked), 2 on setup errors.

use std::process::ExitCode;

use clap::Parser;
use latchkey_cli::{model::config::Cli, startup};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    match startup::run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("latchkey: {:#}", e);
            ExitCode::from(2)
        }
    }
}
