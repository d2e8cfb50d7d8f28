use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::daemon::storage::{
    database::{RecordStorage, SqliteStorage},
    entities::ReflectionEntity,
    DATABASE_FILE,
};

/// Stores a reflection stamped with `now`. Notes that are empty after trimming are rejected.
pub fn record_note(
    storage: &impl RecordStorage,
    text: &str,
    now: DateTime<Utc>,
) -> Result<ReflectionEntity> {
    let note = text.trim();
    if note.is_empty() {
        bail!("Nothing to save, the note is empty");
    }
    let reflection = ReflectionEntity {
        recorded_at: now,
        note: note.into(),
    };
    storage.record_reflection(&reflection)?;
    info!("Saved reflection at {}", reflection.recorded_at);
    Ok(reflection)
}

pub fn process_note_command(words: &[String], app_dir: &Path) -> Result<()> {
    let storage = SqliteStorage::open(&app_dir.join(DATABASE_FILE))?;
    let reflection = record_note(&storage, &words.join(" "), Utc::now())?;
    println!("Reflection saved: {}", reflection.note);
    Ok(())
}
