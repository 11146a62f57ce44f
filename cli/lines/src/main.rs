//! tp-lines CLI
//!
//! Runs a line pipeline over a file and prints the result.

use clap::Parser;
use tp_cli_common::init_logging;
use tp_error::TpError;
use tp_pipeline::CancellationToken;
use tracing::warn;

mod args;
mod run;

use args::Cli;

/// Exit code for a run stopped by an interrupt.
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr; stdout carries the lines
    init_logging(args.log_level)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling pipeline");
                cancel.cancel();
            }
        }
    });

    match run::execute(&args, std::io::stdout(), cancel).await {
        Ok((summary, _)) => {
            run::print_summary(&summary);
            Ok(())
        }
        Err(e) if is_cancelled(&e) => std::process::exit(EXIT_CANCELLED),
        Err(e) => Err(e),
    }
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<TpError>(), Some(TpError::Cancelled))
}
