// file: src/pipeline/progress.rs
// description: batch statistics and progress reporting for pipeline runs
// reference: uses indicatif for progress bars and tracks processing counts

use crate::models::ProcessingDocument;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub processed: usize,
    pub relevant: usize,
    pub new_items: usize,
    pub failed: usize,
    pub duration_secs: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.processed + self.failed;
        if total == 0 {
            return 0.0;
        }
        (self.processed as f64 / total as f64) * 100.0
    }
}

pub struct ProgressTracker {
    bar: ProgressBar,
    processed: AtomicUsize,
    relevant: AtomicUsize,
    new_items: AtomicUsize,
    failed: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_documents: usize, visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(total_documents as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .expect("Failed to create progress bar template")
                    .progress_chars("█▓▒░"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            processed: AtomicUsize::new(0),
            relevant: AtomicUsize::new(0),
            new_items: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_processed(&self, doc: &ProcessingDocument) {
        self.processed.fetch_add(1, Ordering::SeqCst);
        if doc.is_relevant() {
            self.relevant.fetch_add(1, Ordering::SeqCst);
        }
        if doc.is_new() {
            self.new_items.fetch_add(1, Ordering::SeqCst);
        }
        self.bar.inc(1);
        self.update_message();
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.bar.inc(1);
        self.update_message();
    }

    pub fn finish(&self) -> RunStats {
        self.bar.finish_and_clear();

        RunStats {
            processed: self.processed.load(Ordering::SeqCst),
            relevant: self.relevant.load(Ordering::SeqCst),
            new_items: self.new_items.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_message(&self) {
        let relevant = self.relevant.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        self.bar
            .set_message(format!("Relevant: {relevant} | Failed: {failed}"));
    }
}
