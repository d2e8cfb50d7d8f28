use std::{collections::HashMap, sync::Arc};

use chrono::Duration;

use crate::daemon::storage::entities::UsageIntervalEntity;

#[derive(Debug, PartialEq)]
pub struct AppUsage {
    pub app_name: Arc<str>,
    pub duration: Duration,
}

impl AppUsage {
    fn new(app_name: Arc<str>) -> Self {
        Self {
            app_name,
            duration: Duration::zero(),
        }
    }

    /// Total time rounded to the nearest whole second.
    pub fn rounded_seconds(&self) -> i64 {
        (self.duration.num_milliseconds() + 500).div_euclid(1000)
    }
}

/// Returns vector of unique applications with their total usage, longest first. Applications
/// with equal totals are ordered by name.
pub fn analyze_apps(intervals: impl IntoIterator<Item = UsageIntervalEntity>) -> Vec<AppUsage> {
    let mut map = HashMap::<Arc<str>, AppUsage>::new();

    for v in intervals {
        let duration = v.duration();
        let analysis = map
            .entry(v.app_name.clone())
            .or_insert_with(|| AppUsage::new(v.app_name));
        analysis.duration += duration;
    }

    let mut usages = map.into_values().collect::<Vec<_>>();
    usages.sort_by(|a, b| {
        b.duration
            .cmp(&a.duration)
            .then_with(|| a.app_name.cmp(&b.app_name))
    });
    usages
}
