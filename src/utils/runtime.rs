use anyhow::Result;

/// The daemon does all of its work on one thread: sampling, tracking and writing to the
/// database never run concurrently.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
