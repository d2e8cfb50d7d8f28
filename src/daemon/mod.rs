use std::path::{Path, PathBuf};

use anyhow::Result;
use collection::{collector::DataCollectionModule, ignored::IgnoredApps};
use config::TrackerConfig;
use processing::{local_save::LocalSaver, ProcessingModule};
use storage::{database::SqliteStorage, entities::UsageIntervalEntity, DATABASE_FILE};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    utils::clock::{Clock, DefaultClock},
    window_api::{ForegroundSampler, GenericSampler},
};

pub mod args;
pub mod collection;
pub mod config;
pub mod processing;
pub mod shutdown;
pub mod storage;

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf, config: TrackerConfig) -> Result<()> {
    let sampler = GenericSampler::new()?;
    let shutdown_token = CancellationToken::new();
    run_daemon(&dir, config, sampler, shutdown_token, DefaultClock).await
}

async fn run_daemon(
    dir: &Path,
    config: TrackerConfig,
    sampler: impl ForegroundSampler + 'static,
    shutdown_token: CancellationToken,
    clock: impl Clock,
) -> Result<()> {
    info!("Starting tracker with {:?}", config);
    let (sender, receiver) = mpsc::channel::<UsageIntervalEntity>(10);

    let collector = create_collector(sender, sampler, &shutdown_token, &config, clock);
    let processor = create_processor(&dir.join(DATABASE_FILE), receiver);

    let (_, collection_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = collector.run().await;
            // Makes sure signal detection stops too if collection ended on its own.
            shutdown_token.cancel();
            result
        },
        processor.run(),
    );

    if let Err(collection_result) = collection_result {
        error!("Collection module got an error {:?}", collection_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    info!("Tracker stopped");
    Ok(())
}

fn create_collector(
    sender: mpsc::Sender<UsageIntervalEntity>,
    sampler: impl ForegroundSampler + 'static,
    shutdown_token: &CancellationToken,
    config: &TrackerConfig,
    clock: impl Clock,
) -> DataCollectionModule {
    DataCollectionModule::new(
        sender,
        Box::new(sampler),
        shutdown_token.clone(),
        IgnoredApps::new(config.ignored_apps.iter().map(String::as_str)),
        config.poll_interval,
        config.flush_on_exit,
        Box::new(clock),
    )
}

/// Storage that can't be opened is not fatal: the tracker keeps running and its intervals are
/// dropped.
fn create_processor(
    database_path: &Path,
    receiver: mpsc::Receiver<UsageIntervalEntity>,
) -> ProcessingModule<LocalSaver<SqliteStorage>> {
    let storage = SqliteStorage::open(database_path)
        .inspect_err(|e| error!("Storage is unavailable, usage won't be saved {e:?}"))
        .ok();
    ProcessingModule::new(receiver, LocalSaver::new(storage))
}
