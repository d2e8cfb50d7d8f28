use std::{ops::Deref, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info, warn};

use super::entities::{
    timestamp_from_text, timestamp_to_text, ReflectionEntity, UsageIntervalEntity,
    UsageTotalEntity,
};

/// Interface for abstracting storage of usage intervals and reflections.
pub trait RecordStorage {
    /// Durably stores a completed usage interval.
    fn record_usage(&self, interval: &UsageIntervalEntity) -> Result<()>;

    /// Durably stores a reflection.
    fn record_reflection(&self, reflection: &ReflectionEntity) -> Result<()>;

    /// Retrieves intervals whose start lies in `[from, to)`.
    fn usage_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageIntervalEntity>>;

    /// Retrieves every reflection in the order it was recorded.
    fn reflections(&self) -> Result<Vec<ReflectionEntity>>;

    /// Sums the time of every stored interval per application and returns the `limit` largest
    /// totals, longest first and by name on ties.
    fn top_usage_totals(&self, limit: usize) -> Result<Vec<UsageTotalEntity>>;
}

impl<T: Deref> RecordStorage for T
where
    T::Target: RecordStorage,
{
    fn record_usage(&self, interval: &UsageIntervalEntity) -> Result<()> {
        self.deref().record_usage(interval)
    }

    fn record_reflection(&self, reflection: &ReflectionEntity) -> Result<()> {
        self.deref().record_reflection(reflection)
    }

    fn usage_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageIntervalEntity>> {
        self.deref().usage_started_between(from, to)
    }

    fn reflections(&self) -> Result<Vec<ReflectionEntity>> {
        self.deref().reflections()
    }

    fn top_usage_totals(&self, limit: usize) -> Result<Vec<UsageTotalEntity>> {
        self.deref().top_usage_totals(limit)
    }
}

/// The main realization of [RecordStorage], backed by a single SQLite file.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`. The schema is created if it doesn't exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        info!("Database opened at {}", path.display());
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let storage = Self {
            conn: Connection::open_in_memory()?,
        };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS app_usage (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    app_name    TEXT NOT NULL,
                    start_time  TEXT NOT NULL,
                    end_time    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS reflections (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp   TEXT NOT NULL,
                    note        TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_app_usage_start_time ON app_usage(start_time);",
            )
            .context("failed to create database schema")?;
        Ok(())
    }

    /// Every stored interval in insertion order.
    #[cfg(test)]
    pub fn all_usage(&self) -> Result<Vec<UsageIntervalEntity>> {
        let mut statement = self
            .conn
            .prepare("SELECT app_name, start_time, end_time FROM app_usage ORDER BY id")?;
        Self::collect_intervals(&mut statement, [])
    }

    fn collect_intervals(
        statement: &mut rusqlite::Statement<'_>,
        params: impl rusqlite::Params,
    ) -> Result<Vec<UsageIntervalEntity>> {
        let rows = statement.query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut intervals = vec![];
        for row in rows {
            let (app_name, start, end) = row?;
            match parse_interval(&app_name, &start, &end) {
                Ok(v) => intervals.push(v),
                // A row written by hand or by an older build shouldn't make every report fail.
                Err(e) => warn!("Skipping unreadable usage row for {app_name}: {e}"),
            }
        }
        Ok(intervals)
    }
}

fn parse_interval(app_name: &str, start: &str, end: &str) -> Result<UsageIntervalEntity> {
    Ok(UsageIntervalEntity {
        app_name: app_name.into(),
        start: timestamp_from_text(start)?,
        end: timestamp_from_text(end)?,
    })
}

fn reflection_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

impl RecordStorage for SqliteStorage {
    fn record_usage(&self, interval: &UsageIntervalEntity) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO app_usage (app_name, start_time, end_time) VALUES (?1, ?2, ?3)",
                params![
                    interval.app_name.as_ref(),
                    timestamp_to_text(interval.start),
                    timestamp_to_text(interval.end),
                ],
            )
            .context("failed to insert usage interval")?;
        debug!(
            "App usage logged: {} from {} to {}",
            interval.app_name, interval.start, interval.end
        );
        Ok(())
    }

    fn record_reflection(&self, reflection: &ReflectionEntity) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO reflections (timestamp, note) VALUES (?1, ?2)",
                params![
                    timestamp_to_text(reflection.recorded_at),
                    reflection.note.as_ref()
                ],
            )
            .context("failed to insert reflection")?;
        debug!("Reflection saved: {}", reflection.note);
        Ok(())
    }

    fn usage_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageIntervalEntity>> {
        let mut statement = self.conn.prepare(
            "SELECT app_name, start_time, end_time FROM app_usage
             WHERE start_time >= ?1 AND start_time < ?2
             ORDER BY id",
        )?;
        Self::collect_intervals(
            &mut statement,
            params![timestamp_to_text(from), timestamp_to_text(to)],
        )
    }

    fn reflections(&self) -> Result<Vec<ReflectionEntity>> {
        let mut statement = self
            .conn
            .prepare("SELECT timestamp, note FROM reflections ORDER BY id")?;
        let rows = statement.query_map([], reflection_from_row)?;

        let mut reflections = vec![];
        for row in rows {
            let (timestamp, note) = row?;
            match timestamp_from_text(&timestamp) {
                Ok(recorded_at) => reflections.push(ReflectionEntity {
                    recorded_at,
                    note: note.into(),
                }),
                Err(e) => warn!("Skipping unreadable reflection: {e}"),
            }
        }
        Ok(reflections)
    }

    fn top_usage_totals(&self, limit: usize) -> Result<Vec<UsageTotalEntity>> {
        // Each interval is rounded to whole milliseconds before summing, so the total is exact.
        let mut statement = self.conn.prepare(
            "SELECT app_name,
                    SUM(CAST(ROUND((julianday(end_time) - julianday(start_time)) * 86400000)
                        AS INTEGER)) AS total_ms
             FROM app_usage
             WHERE julianday(start_time) IS NOT NULL AND julianday(end_time) IS NOT NULL
             GROUP BY app_name
             ORDER BY total_ms DESC, app_name ASC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement.query_map(params![limit], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut totals = vec![];
        for row in rows {
            let (app_name, total_ms) = row?;
            totals.push(UsageTotalEntity {
                app_name: app_name.into(),
                total: Duration::milliseconds(total_ms),
            });
        }
        Ok(totals)
    }
}
