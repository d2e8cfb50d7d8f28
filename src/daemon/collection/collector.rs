use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    daemon::storage::entities::UsageIntervalEntity, utils::clock::Clock,
    window_api::ForegroundSampler,
};

use super::{ignored::IgnoredApps, tracker::UsageTracker};

/// Samples the foreground application on a fixed schedule and forwards every completed usage
/// interval to the processing module. The module is the only owner of the tracker state.
pub struct DataCollectionModule {
    next: mpsc::Sender<UsageIntervalEntity>,
    sampler: Box<dyn ForegroundSampler>,
    shutdown: CancellationToken,
    ignored_apps: IgnoredApps,
    tracker: UsageTracker,
    collection_frequency: Duration,
    flush_on_exit: bool,
    time_provider: Box<dyn Clock>,
}

impl DataCollectionModule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        next: mpsc::Sender<UsageIntervalEntity>,
        sampler: Box<dyn ForegroundSampler>,
        shutdown: CancellationToken,
        ignored_apps: IgnoredApps,
        collection_frequency: Duration,
        flush_on_exit: bool,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            sampler,
            shutdown,
            ignored_apps,
            tracker: UsageTracker::new(),
            collection_frequency,
            flush_on_exit,
            time_provider,
        }
    }

    /// Failing to sample is logged and counts as having nothing to observe.
    fn sample(&mut self) -> Option<Arc<str>> {
        match self.sampler.current_foreground_app() {
            Ok(sample) => {
                debug!("Sampled {sample:?}");
                self.ignored_apps.filter(sample)
            }
            Err(e) => {
                error!("Encountered an error during sampling {:?}", e);
                None
            }
        }
    }

    async fn send(&self, interval: UsageIntervalEntity) -> Result<()> {
        let span = info_span!("Sending usage interval");
        debug!("Sending interval {:?}", interval);
        self.next
            .send(interval)
            .instrument(span)
            .await
            .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
        info!("Successfully sent interval");
        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        let sample = self.sample();
        let now = self.time_provider.time();
        if let Some(interval) = self.tracker.observe(sample, now) {
            self.send(interval).await?;
        }
        Ok(())
    }

    /// Executes the collector event loop.
    pub async fn run(mut self) -> Result<()> {
        let mut collection_point = self.time_provider.instant();
        loop {
            self.tick().await?;

            collection_point = next_collection_point(
                collection_point,
                self.time_provider.instant(),
                self.collection_frequency,
            );

            tokio::select! {
                // Cancelation means we stop execution of the event loop. Which means we also drop
                // the sender channel and consequently stop processing module.
                _ = self.shutdown.cancelled() => {
                    break
                }
                _ = self.time_provider.sleep_until(collection_point) => ()
            }
        }

        if self.flush_on_exit {
            if let Some(interval) = self.tracker.finish(self.time_provider.time()) {
                info!("Flushing interval in progress for {}", interval.app_name);
                self.send(interval).await?;
            }
        }
        Ok(())
    }
}

/// Returns the first collection point after `previous` that isn't already in the past. Points
/// that passed while a tick was still running are skipped rather than run back to back.
fn next_collection_point(previous: Instant, now: Instant, frequency: Duration) -> Instant {
    let mut next = previous + frequency;
    let mut skipped = 0;
    while next < now {
        next += frequency;
        skipped += 1;
    }
    if skipped > 0 {
        warn!("Sampling fell behind, skipped {skipped} tick(s)");
    }
    next
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::{anyhow, Result};
    use chrono::{DateTime, TimeZone, Utc};
    use tokio::{sync::mpsc, time::Instant};
    use tokio_util::sync::CancellationToken;

    use super::{next_collection_point, DataCollectionModule};
    use crate::{
        daemon::{collection::ignored::IgnoredApps, storage::entities::UsageIntervalEntity},
        utils::{clock::TokioClock, logging::TEST_LOGGING},
        window_api::MockForegroundSampler,
    };

    const FREQUENCY: Duration = Duration::from_secs(5);

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 29, 9, 0, 0).unwrap()
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        start_time() + chrono::Duration::seconds(seconds)
    }

    fn sampler_of(samples: Vec<Result<Option<&'static str>>>) -> MockForegroundSampler {
        let mut samples = samples.into_iter();
        let mut sampler = MockForegroundSampler::new();
        sampler
            .expect_current_foreground_app()
            .returning(move || match samples.next() {
                Some(v) => v.map(|v| v.map(Arc::from)),
                None => Ok(None),
            });
        sampler
    }

    /// Runs the collector on a paused clock for `run_for` and returns everything it sent.
    async fn collect(
        sampler: MockForegroundSampler,
        flush_on_exit: bool,
        run_for: Duration,
    ) -> Result<Vec<UsageIntervalEntity>> {
        *TEST_LOGGING;
        let (sender, mut receiver) = mpsc::channel(16);
        let shutdown = CancellationToken::new();
        let collector = DataCollectionModule::new(
            sender,
            Box::new(sampler),
            shutdown.clone(),
            IgnoredApps::default(),
            FREQUENCY,
            flush_on_exit,
            Box::new(TokioClock::starting_at(start_time())),
        );

        let (_, result) = tokio::join!(
            async {
                tokio::time::sleep(run_for).await;
                shutdown.cancel();
            },
            collector.run(),
        );
        result?;

        let mut intervals = vec![];
        while let Some(v) = receiver.recv().await {
            intervals.push(v);
        }
        Ok(intervals)
    }

    #[tokio::test(start_paused = true)]
    async fn test_collector_emits_intervals_on_transitions() -> Result<()> {
        let sampler = sampler_of(vec![
            Ok(Some("Safari")),
            Ok(Some("Xcode")),
            Ok(Some("Xcode")),
            Ok(Some("Safari")),
            Ok(Some("Terminal")),
        ]);

        let intervals = collect(sampler, false, Duration::from_secs(22)).await?;

        assert_eq!(
            intervals,
            vec![
                UsageIntervalEntity {
                    app_name: "Xcode".into(),
                    start: at(5),
                    end: at(15),
                },
                UsageIntervalEntity {
                    app_name: "Safari".into(),
                    start: at(15),
                    end: at(20),
                },
            ]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_collector_ignores_login_window_and_errors() -> Result<()> {
        let sampler = sampler_of(vec![
            Ok(Some("Mail")),
            Ok(Some("Notes")),
            Ok(Some("loginwindow")),
            Err(anyhow!("display went away")),
            Ok(None),
            Ok(Some("Mail")),
        ]);

        let intervals = collect(sampler, false, Duration::from_secs(27)).await?;

        // Lock screen time is attributed to the app that was in front before locking.
        assert_eq!(
            intervals,
            vec![UsageIntervalEntity {
                app_name: "Notes".into(),
                start: at(5),
                end: at(25),
            }]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_collector_lock_screen_inside_same_app() -> Result<()> {
        let sampler = sampler_of(vec![
            Ok(Some("Mail")),
            Ok(Some("Notes")),
            Ok(Some("loginwindow")),
            Ok(Some("Notes")),
        ]);

        let intervals = collect(sampler, false, Duration::from_secs(17)).await?;
        assert!(intervals.is_empty());

        let sampler = sampler_of(vec![
            Ok(Some("Mail")),
            Ok(Some("Notes")),
            Ok(Some("loginwindow")),
            Ok(Some("Notes")),
            Ok(Some("Mail")),
        ]);

        let intervals = collect(sampler, false, Duration::from_secs(22)).await?;

        // The whole stretch, lock screen included, belongs to Notes.
        assert_eq!(
            intervals,
            vec![UsageIntervalEntity {
                app_name: "Notes".into(),
                start: at(5),
                end: at(20),
            }]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_collector_drops_open_interval_by_default() -> Result<()> {
        let sampler = sampler_of(vec![Ok(Some("Mail")), Ok(Some("Notes")), Ok(Some("Notes"))]);

        let intervals = collect(sampler, false, Duration::from_secs(12)).await?;

        assert!(intervals.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_collector_flushes_open_interval_when_asked() -> Result<()> {
        let sampler = sampler_of(vec![Ok(Some("Mail")), Ok(Some("Notes")), Ok(Some("Notes"))]);

        let intervals = collect(sampler, true, Duration::from_secs(12)).await?;

        assert_eq!(
            intervals,
            vec![UsageIntervalEntity {
                app_name: "Notes".into(),
                start: at(5),
                end: at(12),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_next_collection_point_on_schedule() {
        let start = Instant::now();
        let next = next_collection_point(start, start + Duration::from_secs(1), FREQUENCY);
        assert_eq!(next, start + FREQUENCY);
    }

    #[test]
    fn test_next_collection_point_skips_missed_ticks() {
        let start = Instant::now();
        // The tick took 12 seconds, so the points at 5s and 10s are gone.
        let next = next_collection_point(start, start + Duration::from_secs(12), FREQUENCY);
        assert_eq!(next, start + Duration::from_secs(15));
    }
}
