//! indicatif progress bar for the branch scan

use indicatif::{ProgressBar, ProgressStyle};

use branch_cleaner_core::ProgressSink;

/// Progress bar showing the branch currently being analyzed
pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    /// Create a bar; hidden bars accept updates and draw nothing
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template(" {pos:>3}/{len:3} {bar:28.green/red} {percent:>3}%  {msg}")
                .expect("valid template")
                .progress_chars("●●●"),
        );
        Self { bar }
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressSink for ScanProgress {
    fn trial_started(&mut self, branch: &str, _index: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message(branch.to_string());
    }

    fn trial_finished(&mut self, _branch: &str, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn scan_finished(&mut self) {
        self.bar.set_message("");
        self.bar.finish();
    }
}
