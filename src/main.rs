//! Main entry point for the sourcebundle CLI app

use sourcebundle::{cli, cli_runner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli::log_filter_from_env()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli_runner::run_cli_app().await {
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            // Help and version output are requests, not failures.
            let _ = clap_err.print();
            if !clap_err.use_stderr() {
                return std::process::ExitCode::SUCCESS;
            }
        } else {
            eprintln!("Error: {}", e);
        }
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}
