mod cli;
mod logging;
mod report;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gs_core::SearchClient;
use gs_guardian::GuardianClient;
use gs_pipeline::Pipeline;
use tracing::{error, info};

use crate::cli::Cli;

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let query = cli.search_query().context("invalid search query")?;
    let config = cli.pipeline_config().context("invalid configuration")?;

    let search: Arc<dyn SearchClient> =
        Arc::new(GuardianClient::new(&config.guardian).context("failed to create Guardian client")?);
    info!("🗞️ Guardian client initialized ({:?})", config.guardian);

    let publisher = gs_queue::create_publisher(config.queue.as_ref())
        .await
        .context("failed to create queue publisher")?;

    let outcome = Pipeline::new(search, publisher)
        .with_policy(config.policy)
        .run(&query)
        .await;
    report::report(&outcome);
    Ok(report::exit_code(&outcome))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::from(report::EXIT_USAGE)
        }
    }
}
