//! esdump CLI
//!
//! Dumps an Elasticsearch index as JSON lines to standard output

use clap::Parser;
use esdump::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    // Logs go to stderr, stdout carries the documents
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runner = Runner::new(cli);

    match runner.run().await {
        Ok(_) => {}
        // already reported by the final dump report
        Err(e) if e.is_cancelled() => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
