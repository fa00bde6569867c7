#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `area_map` binary.
//!
//! The census download reports observations through
//! [`ProgressCallback`]; [`CensusProgress`] draws them on an `indicatif`
//! bar. [`init_logger`] routes `log` output through the same
//! [`MultiProgress`] so a warning about a retried page does not break the
//! bar mid-line.

use std::time::Duration;

use area_map_source::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const COUNTED_TEMPLATE: &str =
    "{msg:<28} [{bar:36.green/white}] {human_pos}/{human_len} observations ({eta})";

/// Observation counter for the census download.
///
/// The API only announces its total with the first page, so the bar spins
/// until [`ProgressCallback::set_total`] and counts afterwards.
pub struct CensusProgress {
    bar: ProgressBar,
    counted: ProgressStyle,
}

impl CensusProgress {
    /// Adds a spinner labelled `message` to `multi`.
    #[must_use]
    pub fn attach(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message(message.to_string());

        let counted = ProgressStyle::with_template(COUNTED_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        Self { bar, counted }
    }
}

impl ProgressCallback for CensusProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_style(self.counted.clone());
        self.bar.set_length(total);
        self.bar.reset_eta();
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge`.
///
/// Logs at `info` unless `RUST_LOG` says otherwise. Returns the
/// [`MultiProgress`] every bar has to be attached to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A second call keeps the first logger.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_to_counted_bar_once_total_known() {
        let multi = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        let progress = CensusProgress::attach(&multi, "Fetching");
        assert_eq!(progress.bar.length(), None);

        progress.set_total(250);
        progress.inc(100);
        progress.inc(50);
        assert_eq!(progress.bar.length(), Some(250));
        assert_eq!(progress.bar.position(), 150);

        progress.finish("done".to_string());
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn templates_parse() {
        assert!(ProgressStyle::with_template(SPINNER_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(COUNTED_TEMPLATE).is_ok());
    }
}
