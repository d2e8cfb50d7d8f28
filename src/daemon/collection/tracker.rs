use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::daemon::storage::entities::UsageIntervalEntity;

/// Turns a stream of foreground application samples into closed usage intervals.
///
/// An interval's start is only known retroactively, at the next observed transition, so the
/// tracker needs two distinct applications before it can start a clock and a third before the
/// first interval is emitted.
#[derive(Debug, Default)]
pub struct UsageTracker {
    previous_app: Option<Arc<str>>,
    usage_started_at: Option<DateTime<Utc>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_app(&self) -> Option<&Arc<str>> {
        self.previous_app.as_ref()
    }

    pub fn usage_started_at(&self) -> Option<DateTime<Utc>> {
        self.usage_started_at
    }

    /// Feeds an observation into the tracker. `None` means there was nothing to observe (no
    /// foreground app, or an ignored one) and never changes the state.
    ///
    /// Returns the interval of the previous application if this sample is a transition.
    pub fn observe(
        &mut self,
        current_app: Option<Arc<str>>,
        now: DateTime<Utc>,
    ) -> Option<UsageIntervalEntity> {
        let current_app = current_app?;

        let Some(previous_app) = self.previous_app.as_ref() else {
            debug!("First observation {current_app}");
            self.previous_app = Some(current_app);
            return None;
        };

        if *previous_app == current_app {
            return None;
        }

        let finished = self.usage_started_at.and_then(|start| {
            if start < now {
                Some(UsageIntervalEntity {
                    app_name: previous_app.clone(),
                    start,
                    end: now,
                })
            } else {
                warn!("Clock went backwards from {start} to {now}, dropping interval");
                None
            }
        });

        debug!("Transition {previous_app} -> {current_app} at {now}");
        self.previous_app = Some(current_app);
        self.usage_started_at = Some(now);
        finished
    }

    /// Closes the interval in progress using `now` as its end. Used only when flushing on exit is
    /// enabled; the tracker is reset afterwards.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<UsageIntervalEntity> {
        let previous_app = self.previous_app.take();
        let start = self.usage_started_at.take()?;
        let app_name = previous_app?;
        (start < now).then_some(UsageIntervalEntity {
            app_name,
            start,
            end: now,
        })
    }
}
