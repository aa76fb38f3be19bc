//! Run-progress accounting: monotonic counters, periodic log summaries, and
//! an optional progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::{Duration, Instant};

/// Report cadence (in processed items) during the project phase.
pub const PROJECT_REPORT_INTERVAL: usize = 10;
/// Report cadence during the file phase.
pub const FILE_REPORT_INTERVAL: usize = 50;
/// Periodic summaries are only emitted for runs larger than this.
const REPORT_THRESHOLD: usize = 100;

/// Counters for one sorting run.
///
/// Counters only ever increase. Created at run start, dropped with the final
/// report at run end; never persisted.
pub struct SortingProgress {
    pub total_items: usize,
    pub processed_items: usize,
    pub projects_moved: usize,
    pub files_moved: usize,
    pub errors: usize,
    started_at: Instant,
    bar: Option<ProgressBar>,
}

impl SortingProgress {
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            processed_items: 0,
            projects_moved: 0,
            files_moved: 0,
            errors: 0,
            started_at: Instant::now(),
            bar: None,
        }
    }

    /// Like [`SortingProgress::new`], with a terminal progress bar that
    /// advances on every processed item.
    pub fn with_bar(total_items: usize) -> Self {
        let mut progress = Self::new(total_items);
        progress.bar = Some(styled_bar(total_items as u64));
        progress
    }

    /// Records the outcome of one project relocation.
    pub fn record_project(&mut self, moved: bool) {
        if moved {
            self.projects_moved += 1;
        } else {
            self.errors += 1;
        }
        self.advance();
        self.maybe_report(PROJECT_REPORT_INTERVAL);
    }

    /// Records the outcome of one file relocation.
    pub fn record_file(&mut self, moved: bool) {
        if moved {
            self.files_moved += 1;
        } else {
            self.errors += 1;
        }
        self.advance();
        self.maybe_report(FILE_REPORT_INTERVAL);
    }

    /// Records a failure outside the per-item move path, such as a directory
    /// that could not be deleted during reclamation.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    fn advance(&mut self) {
        self.processed_items += 1;
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn maybe_report(&self, interval: usize) {
        if self.total_items > REPORT_THRESHOLD && self.processed_items % interval == 0 {
            self.report();
        }
    }

    /// Logs the current counters with percentage and elapsed time.
    pub fn report(&self) {
        if self.total_items == 0 {
            return;
        }
        let percentage = (self.processed_items as f64 / self.total_items as f64) * 100.0;
        info!(
            "Progress: {}/{} ({:.1}%) - Projects: {}, Files: {}, Errors: {}, Elapsed: {:.1}s",
            self.processed_items,
            self.total_items,
            percentage,
            self.projects_moved,
            self.files_moved,
            self.errors,
            self.elapsed().as_secs_f64()
        );
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Clears the attached bar, if any.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn styled_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    bar
}
