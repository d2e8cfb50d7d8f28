//!  Storage is organized through [database::SqliteStorage].
//!  The basic idea is:
//!   - There is a single SQLite file in the application directory.
//!   - Completed usage intervals go into `app_usage`, notes go into `reflections`.
//!   - Timestamps are stored as RFC 3339 UTC text, so they sort and compare as strings.

pub mod database;
pub mod entities;

/// File name of the database inside the application directory.
pub const DATABASE_FILE: &str = "usage.sqlite";
