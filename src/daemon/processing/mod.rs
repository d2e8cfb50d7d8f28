use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info};

use super::storage::entities::UsageIntervalEntity;

pub mod local_save;
pub mod module;

/// Receives completed usage intervals and hands them to a processor. A failed interval is logged
/// and dropped; there is no retry.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<UsageIntervalEntity>,
    processor: Processor,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<UsageIntervalEntity>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(interval) = self.receiver.recv().await {
            debug!("Processing interval {:?}", interval);
            match self.processor.process_next(interval.clone()).await {
                Ok(_) => {
                    info!("Processed interval {:?}", interval)
                }
                Err(e) => {
                    error!("Error processing interval {:?}: {e:?}", interval)
                }
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::{bail, Result};
    use chrono::{Duration, TimeZone, Utc};
    use tokio::sync::mpsc;

    use super::{module::EventProcessor, ProcessingModule};
    use crate::daemon::storage::entities::UsageIntervalEntity;

    #[derive(Default)]
    struct Seen {
        accepted: Vec<UsageIntervalEntity>,
        attempts: usize,
        finalized: bool,
    }

    #[derive(Default, Clone)]
    struct FlakyProcessor {
        seen: Arc<Mutex<Seen>>,
    }

    impl EventProcessor for FlakyProcessor {
        async fn process_next(&mut self, interval: UsageIntervalEntity) -> Result<()> {
            let mut seen = self.seen.lock().unwrap();
            seen.attempts += 1;
            if interval.app_name.as_ref() == "broken" {
                bail!("disk full");
            }
            seen.accepted.push(interval);
            Ok(())
        }

        async fn finalize(&mut self) -> Result<()> {
            self.seen.lock().unwrap().finalized = true;
            Ok(())
        }
    }

    fn interval(app: &str, start_s: i64) -> UsageIntervalEntity {
        let start =
            Utc.with_ymd_and_hms(2024, 11, 29, 9, 0, 0).unwrap() + Duration::seconds(start_s);
        UsageIntervalEntity {
            app_name: app.into(),
            start,
            end: start + Duration::seconds(5),
        }
    }

    #[tokio::test]
    async fn test_failures_are_dropped_without_retry() -> Result<()> {
        let (sender, receiver) = mpsc::channel(4);
        let processor = FlakyProcessor::default();

        sender.send(interval("a", 0)).await?;
        sender.send(interval("broken", 5)).await?;
        sender.send(interval("c", 10)).await?;
        drop(sender);

        ProcessingModule::new(receiver, processor.clone()).run().await?;

        let seen = processor.seen.lock().unwrap();
        assert_eq!(seen.attempts, 3);
        assert_eq!(seen.accepted, vec![interval("a", 0), interval("c", 10)]);
        assert!(seen.finalized);
        Ok(())
    }
}
