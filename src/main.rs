use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::info;

use radiohost_core::job::JobManager;
use radiohost_core::orchestrator::{JobStatus, PipelineConfig};
use radiohost_core::telemetry::init_tracing;

/// Topic-to-podcast generator
#[derive(Parser, Debug)]
#[command(name = "radiohost")]
#[command(about = "Generate a two-host Hinglish podcast episode from a topic")]
struct Args {
    /// Directory the finished audio is written to
    #[arg(long, env = "RADIOHOST_OUTPUT_DIR", value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline for one topic
    Generate {
        /// Topic to look up and talk about
        topic: String,
    },
    /// List topic titles matching a query
    Suggest {
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_tracing()?;
    let args = Args::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    match args.command {
        Command::Generate { topic } => generate(config, &topic).await,
        Command::Suggest { query } => suggest(&query).await,
    }
}

async fn generate(config: PipelineConfig, topic: &str) -> Result<()> {
    let manager = JobManager::from_config(config)?;
    let mut updates = manager.subscribe_updates();
    let handle = manager.submit(topic).await?;
    let job_id = handle.id();

    let progress = tokio::spawn(async move {
        loop {
            let update = match updates.recv().await {
                Ok(update) => update,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if update.job_id != job_id {
                continue;
            }
            info!(
                target: "radiohost",
                progress = update.progress,
                status = update.status.as_str(),
                "{}",
                update.message
            );
            if update.is_terminal() {
                break;
            }
        }
    });

    let record = handle
        .wait()
        .await
        .ok_or_else(|| anyhow!("job {job_id} disappeared"))?;
    progress.abort();

    println!("{}", serde_json::to_string_pretty(&record)?);
    match record.status {
        JobStatus::Completed => Ok(()),
        _ => Err(anyhow!(record.message)),
    }
}

#[cfg(feature = "remote")]
async fn suggest(query: &str) -> Result<()> {
    let client = radiohost_core::remote::WikipediaClient::new(radiohost_core::remote::USER_AGENT);
    for title in client.suggest(query).await {
        println!("{title}");
    }
    Ok(())
}

#[cfg(not(feature = "remote"))]
async fn suggest(_query: &str) -> Result<()> {
    Err(anyhow!("suggestions need the `remote` feature"))
}
