//! Progress feedback for CLI commands
//!
//! Adapts the orchestrator's progress events onto an indicatif bar. All
//! progress output is suppressed when --quiet is set or when JSON output is
//! requested (the bar would corrupt the stream).

use indicatif::{ProgressBar, ProgressStyle};
use schemalens_session::{ProgressEvent, ProgressSink};

/// Progress sink rendering an indicatif bar on stderr.
pub struct IndicatifSink {
    bar: ProgressBar,
}

impl IndicatifSink {
    /// Create a sink, or `None` when output is suppressed.
    pub fn new(quiet: bool) -> Option<Self> {
        if quiet {
            return None;
        }

        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:30} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        Some(Self { bar })
    }

    /// Finish and clear the bar.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for IndicatifSink {
    fn report(&self, event: ProgressEvent) {
        if self.bar.length() != Some(event.total) {
            self.bar.set_length(event.total);
        }
        self.bar.set_message(event.step);
        self.bar.set_position(event.current);
    }
}
