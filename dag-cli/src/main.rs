//! dag-verifier CLI Entry Point
//!
//! Configuration is loaded from environment variables (via .env file) or a
//! JSON file. Command-line arguments override both.
//!
//! Usage:
//!   dag-verifier run                       - One verification pass, then notify
//!   dag-verifier watch                     - Verify every interval until Ctrl-C
//!   dag-verifier normalize-address <addr>  - Print the HTTP URL for a store address
//!   dag-verifier config                    - Show the effective configuration

use clap::Parser;
use dag_cli::logging::{init_logging, LogConfig};
use dag_cli::{handler, Cli};

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(&LogConfig::new(cli.log_format, cli.verbose)) {
        eprintln!("Warning: {}", e);
    }

    if let Err(e) = handler::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
