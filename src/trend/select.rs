use crate::error::Result;
use crate::git::{HistorySource, HistoryStep};
use crate::model::CommitInfo;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    pub min_interval_days: u32,
    pub max_commits: usize,
    pub all_parents: bool,
    pub skip_merges: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            min_interval_days: 7,
            max_commits: usize::MAX,
            all_parents: false,
            skip_merges: false,
        }
    }
}

/// Commits to analyze, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub commits: Vec<CommitInfo>,
    /// Set when the history ended early, e.g. in a shallow clone. The commits
    /// gathered up to that point are still usable.
    pub truncated: Option<String>,
}

pub fn select_commits<S: HistorySource>(
    source: &S,
    start: &CommitInfo,
    options: &SelectOptions,
) -> Result<Selection> {
    let history = source.history(start, options.all_parents)?;
    let selection = select_from(history, options);

    if let Some(reason) = &selection.truncated {
        warn!("Unexpected end of git log, maybe a shallow git repo? ({reason})");
    }
    debug!("Will analyze {} commits", selection.commits.len());

    Ok(selection)
}

/// Apply the interval and cap rules to a newest-first history.
pub fn select_from(
    history: impl IntoIterator<Item = HistoryStep>,
    options: &SelectOptions,
) -> Selection {
    let mut selection = Selection::default();
    if options.max_commits == 0 {
        return selection;
    }

    let mut date_of_last_selected: Option<DateTime<Utc>> = None;
    for step in history {
        let commit = match step {
            HistoryStep::Commit(commit) => commit,
            HistoryStep::Incomplete(reason) => {
                selection.truncated = Some(reason);
                break;
            }
        };

        if options.skip_merges && commit.is_merge() {
            continue;
        }
        if !enough_days_passed(date_of_last_selected, commit.author_date, options.min_interval_days)
        {
            continue;
        }

        date_of_last_selected = Some(commit.author_date);
        selection.commits.push(commit);
        if selection.commits.len() >= options.max_commits {
            break;
        }
    }

    // The log is newest first, rows go oldest first
    selection.commits.reverse();
    selection
}

/// Whether strictly more than `min_interval_days` lie between the last
/// selected commit and `current`. Commits dated after the last selected one
/// never pass, which keeps the selection ordered by date.
pub fn enough_days_passed(
    last_selected: Option<DateTime<Utc>>,
    current: DateTime<Utc>,
    min_interval_days: u32,
) -> bool {
    match last_selected {
        None => true,
        Some(last) => {
            let days = (last - current).num_seconds() as f64 / SECONDS_PER_DAY;
            days > f64::from(min_interval_days)
        }
    }
}
