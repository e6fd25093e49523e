use std::process::exit;
use std::time::Duration;

use blockpath::cli::Cli;
use blockpath::manager;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for operator and debug output
fn init_tracing(debug: bool) {
    let default_level = if debug { "trace" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    // A missing path is a usage request, not an error.
    let Some(path) = cli.path else {
        Cli::command().print_help().ok();
        println!();
        return;
    };

    let opts = manager::Options {
        path,
        ready_timeout: Duration::from_secs(cli.ready_timeout_secs),
    };

    if let Err(err) = manager::run(&opts) {
        eprintln!("blockpath error: {err:#}");
        exit(1);
    }
}
