//! Switchboard CLI - watch and start/stop cloud compute instances

use std::process::ExitCode;

use clap::Parser;
use switchboard_cli::cli::Cli;
use switchboard_cli::output::json;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("switchboard_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let as_json = cli.json;

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            match json::format_error(&e.to_string(), "ERROR") {
                Ok(doc) if as_json => println!("{doc}"),
                _ => eprintln!("Error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}
