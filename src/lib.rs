//! Records which application is in the foreground, turns the samples into usage intervals and
//! keeps them in a local SQLite database next to short notes written by the user. The cli exports
//! the collected data as CSV reports.
//!

pub mod cli;
pub mod daemon;
pub mod utils;
pub mod window_api;
