use anyhow::Context;
use clap::Parser;
use rsqa_processor::cli::{run, setup_logging, Cli};
use std::time::Instant;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(&cli);

    let start = Instant::now();
    let result = run(cli).await.context("rsqa-processor failed");

    match result {
        Ok(()) => info!("Finished in {:.2?}", start.elapsed()),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
