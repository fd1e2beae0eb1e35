//! Secret Management Vault - CLI entry point.
//!
//! Parses arguments, initializes tracing on stderr, and dispatches to the
//! library. Errors print as `Error: <msg>` on stderr with a non-zero exit
//! status; success output goes to stdout and exits zero.

use clap::Parser;
use std::process::ExitCode;

use secret_vault::cli::{self, Cli};

fn main() -> ExitCode {
  let cli = Cli::parse();

  // Logging goes to stderr so stdout stays the machine-readable surface.
  let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
  let subscriber = tracing_subscriber::FmtSubscriber::builder()
    .with_max_level(level)
    .with_writer(std::io::stderr)
    .finish();
  // Do not unwrap/expect; setting the default twice is harmless here.
  let _ = tracing::subscriber::set_global_default(subscriber);

  match cli::run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("Error: {e}");
      ExitCode::FAILURE
    }
  }
}
