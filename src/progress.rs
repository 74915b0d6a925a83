use crate::util::padded_progress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

// Redrawing for every file slows large walks down noticeably
const MIN_REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Side channel for reporting how far the engine has come. Implementations
/// must not influence the counted data.
pub trait ProgressReporter {
    /// `index` is one based.
    fn commit_started(&mut self, index: usize, total: usize);
    /// `index` is the one based number of the file within the current commit.
    fn file_processed(&mut self, index: usize);
    fn finish(&mut self);
}

pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn commit_started(&mut self, _index: usize, _total: usize) {}
    fn file_processed(&mut self, _index: usize) {}
    fn finish(&mut self) {}
}

/// Progress bar on stderr, e.g. `Counting lines in commit  12/345 file 678`.
pub struct TerminalProgress {
    pb: ProgressBar,
    commit_part: String,
    last_drawn: Option<Instant>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Counting lines in {msg} {wide_bar:.cyan/blue}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self {
            pb,
            commit_part: String::new(),
            last_drawn: None,
        }
    }

    fn is_rate_limited(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_drawn {
            if now.duration_since(last) < MIN_REDRAW_INTERVAL {
                return true;
            }
        }
        self.last_drawn = Some(now);
        false
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalProgress {
    fn commit_started(&mut self, index: usize, total: usize) {
        // The survey finishes the bar before the trend run starts
        if self.pb.is_finished() {
            self.pb.reset();
        }
        self.pb.set_length(total as u64);
        self.pb.set_position(index.saturating_sub(1) as u64);
        self.commit_part = if total == 1 {
            String::new()
        } else {
            format!("commit {} ", padded_progress(index, total))
        };
        self.pb.set_message(self.commit_part.clone());
    }

    fn file_processed(&mut self, index: usize) {
        if self.is_rate_limited() {
            return;
        }
        self.pb.set_message(format!("{}file {}", self.commit_part, index));
    }

    fn finish(&mut self) {
        self.pb.finish_and_clear();
    }
}

/// Picks the terminal reporter only when someone can see it.
pub fn reporter(enabled: bool) -> Box<dyn ProgressReporter> {
    if enabled && console::Term::stderr().is_term() {
        Box::new(TerminalProgress::new())
    } else {
        Box::new(NoopProgress)
    }
}
