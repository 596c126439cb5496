//! CLI runner - executes a dump

use crate::cli::commands::Cli;
use crate::engine::{DumpEngine, DumpStats};
use crate::error::{Error, Result, ResultExt};
use crate::http::is_loopback;
use crate::query::{build_query, parse_base_query};
use crate::types::QueryDocument;
use std::io::IsTerminal;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the dump, writing documents to standard output
    pub async fn run(&self) -> Result<DumpStats> {
        let mut config = self.cli.to_config()?;
        if let Err(e) = config.validate() {
            if let Error::Validation { errors } = &e {
                for message in errors {
                    error!("{message}");
                }
            }
            return Err(e);
        }

        if config.compression && is_loopback(&config.base_url).await {
            info!("detected loopback address, disabling compression");
            config.compression = false;
        }

        let base = read_stdin_query().await?;
        let query = build_query(base, &config.query_options());
        log_query(&query);

        let engine = DumpEngine::from_config(config)?;

        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupted, stopping");
                    cancel.cancel();
                }
            }
        });

        let result = engine.dump(query, tokio::io::stdout(), &cancel).await;
        interrupt.abort();
        result
    }
}

/// Read a base query document from stdin, unless stdin is a terminal
async fn read_stdin_query() -> Result<Option<QueryDocument>> {
    if std::io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("reading query from stdin")?;
    parse_base_query(&input)
}

fn log_query(query: &QueryDocument) {
    match serde_json::to_string_pretty(query) {
        Ok(pretty) => {
            info!("scroll query:");
            eprintln!("{pretty}");
        }
        Err(e) => warn!(error = %e, "formatting scroll query"),
    }
}
