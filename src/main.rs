use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use roll_relocate::cli::Cli;
use roll_relocate::{migrate, MigrateError, MigrationSummary};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Validate the options, then migrate the library
fn run(cli: &Cli) -> Result<MigrationSummary, MigrateError> {
    let config = cli.conversion_config()?;
    migrate::run(&cli.library, &config, &cli.migration_options())
}

/// Diagnostics go to stderr; --verbose forces info level, otherwise
/// RUST_LOG can override the warn default.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}
