use anyhow::Result;
use tracing::{info, warn};

use crate::daemon::storage::{database::RecordStorage, entities::UsageIntervalEntity};

use super::module::EventProcessor;

/// Represents saving module. Saving module main goal is to bridge
/// [ProcessingModule](super::ProcessingModule) and [RecordStorage].
///
/// When the storage couldn't be opened at startup the saver still runs, but every interval it
/// receives is dropped.
pub struct LocalSaver<R: RecordStorage> {
    records_storage: Option<R>,
}

impl<R: RecordStorage> LocalSaver<R> {
    pub fn new(records_storage: Option<R>) -> Self {
        Self { records_storage }
    }
}

impl<R: RecordStorage> EventProcessor for LocalSaver<R> {
    async fn process_next(&mut self, interval: UsageIntervalEntity) -> Result<()> {
        match &self.records_storage {
            Some(storage) => storage.record_usage(&interval),
            None => {
                warn!("No storage available, dropping {:?}", interval);
                Ok(())
            }
        }
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.records_storage.take().is_some() {
            info!("Storage closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};

    use super::LocalSaver;
    use crate::daemon::{
        processing::module::EventProcessor,
        storage::{
            database::SqliteStorage,
            entities::UsageIntervalEntity,
        },
    };

    fn interval() -> UsageIntervalEntity {
        let start = Utc.with_ymd_and_hms(2024, 11, 29, 9, 0, 0).unwrap();
        UsageIntervalEntity {
            app_name: "Figma".into(),
            start,
            end: start + Duration::seconds(30),
        }
    }

    #[tokio::test]
    async fn test_saver_writes_to_storage() -> Result<()> {
        let storage = Arc::new(SqliteStorage::open_in_memory()?);
        let mut saver = LocalSaver::new(Some(storage.clone()));

        saver.process_next(interval()).await?;
        saver.finalize().await?;

        assert_eq!(storage.all_usage()?, vec![interval()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_saver_without_storage_is_a_no_op() -> Result<()> {
        let mut saver = LocalSaver::<SqliteStorage>::new(None);

        saver.process_next(interval()).await?;
        saver.finalize().await?;
        Ok(())
    }
}
