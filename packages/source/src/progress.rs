//! Progress reporting for the census download.
//!
//! The fetcher reports observations received against the total the API
//! announces on the first page. [`ProgressCallback`] keeps it independent
//! of how progress is shown; the CLI renders it with an `indicatif` bar.

/// Receives progress updates from a long-running fetch.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}
