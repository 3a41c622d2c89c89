use anyhow::Context;
use dotenv::dotenv;
use tokio::io::BufReader;
use tracing::{event, Level};
use tracing_subscriber::EnvFilter;

use tasksync::config::{Config, StoreConfig};
use tasksync::console::Console;
use tasksync::store::{HttpTaskStore, MemoryTaskStore, TaskStore};
use tasksync::{log, TaskSyncClient};

fn build_store(config: &StoreConfig) -> anyhow::Result<Box<dyn TaskStore>> {
    match config {
        StoreConfig::Http { url, .. } => {
            let store = HttpTaskStore::new(url.clone(), config.timeout()?)
                .with_context(|| format!("cannot use task store at {}", url))?;
            event!(Level::INFO, url = %store.collection_url(), "using http task store");
            Ok(Box::new(store))
        }
        StoreConfig::Memory => {
            event!(Level::INFO, "using in-memory task store");
            Ok(Box::new(MemoryTaskStore::new()))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::load().context("loading configuration")?;
    log::setup(EnvFilter::try_from_env("TASKSYNC_LOG"), config.log.as_ref())?;

    event!(Level::INFO, "Starting tasksync: {}", env!("FULL_VERSION"));

    let store = build_store(&config.store)?;
    let offset = *chrono::Local::now().offset();
    let mut console = Console::new(TaskSyncClient::new(store), offset);

    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}
