use std::process::ExitCode;

use clap::Parser;
use console_cli::ConsoleCliArgs;
use console_cli::Outcome;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let mut args = ConsoleCliArgs::parse();
    console_cli::merge_with_env(&mut args);
    init_tracing(args.verbose);

    let mut stdout = std::io::stdout().lock();
    match console_cli::run(args, &mut stdout) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Denied) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
