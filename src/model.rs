use chrono::{DateTime, Utc};
use gix::bstr::BString;
use gix::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const SCHEMA_VERSION: u32 = 1;

/// A commit as seen by the selector: identity, author date and the root tree
/// of its snapshot. Holds no object buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: ObjectId,
    pub author_date: DateTime<Utc>,
    pub tree: ObjectId,
    pub parent_count: usize,
}

impl CommitInfo {
    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }

    /// Calendar date used for the row, `YYYY-MM-DD` in UTC.
    pub fn date(&self) -> String {
        self.author_date.format("%Y-%m-%d").to_string()
    }
}

/// One file of a snapshot. Only the blob id is kept, never the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: BString,
    pub id: ObjectId,
}

impl FileEntry {
    pub fn extension(&self) -> Option<&str> {
        crate::util::extension_for_raw_name(self.path.as_ref())
    }
}

/// One data point of the trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub date: String,
    pub commit_id: String,
    pub column_to_lines: BTreeMap<String, u64>,
    /// Share of the row total per column, rounded to two decimals. Only set
    /// for `--relative` runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_to_percent: Option<BTreeMap<String, f64>>,
}

impl Row {
    pub fn new(date: String, commit_id: String, column_to_lines: BTreeMap<String, u64>) -> Self {
        Self {
            date,
            commit_id,
            column_to_lines,
            column_to_percent: None,
        }
    }

    pub fn lines(&self, column: &str) -> u64 {
        self.column_to_lines.get(column).copied().unwrap_or(0)
    }

    /// Fill in `column_to_percent`. A row without any lines is 0 everywhere.
    pub fn with_percentages(mut self) -> Self {
        let total: u64 = self.column_to_lines.values().sum();
        let percentages = self
            .column_to_lines
            .iter()
            .map(|(column, &lines)| {
                let percent = if total == 0 {
                    0.0
                } else {
                    (lines as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
                };
                (column.clone(), percent)
            })
            .collect();
        self.column_to_percent = Some(percentages);
        self
    }

    /// Percentage of `column`, if this is a relative row.
    pub fn percent(&self, column: &str) -> Option<f64> {
        self.column_to_percent
            .as_ref()
            .map(|p| p.get(column).copied().unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub start_commit: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Counters collected while processing commits, reported by `--benchmark`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub commits_processed: usize,
    pub files_processed: usize,
    pub lines_counted: u64,
    pub cache_hits: usize,
    pub blobs_scanned: usize,
}

impl RunStats {
    pub fn report(&self, elapsed: Duration) -> String {
        let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
        let files = self.files_processed.max(1) as f64;
        format!(
            "Counted {} lines in {} files in {:.3} seconds. On average:\n\
             {} lines/second\n\
             {} files/second\n\
             {} lines/file\n\
             {} cache hits, {} blobs scanned",
            self.lines_counted,
            self.files_processed,
            seconds,
            (self.lines_counted as f64 / seconds).floor(),
            (self.files_processed as f64 / seconds).floor(),
            (self.lines_counted as f64 / files).floor(),
            self.cache_hits,
            self.blobs_scanned,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn commit_date_is_utc_calendar_day() {
        let commit = CommitInfo {
            id: ObjectId::null(gix::hash::Kind::Sha1),
            author_date: Utc.with_ymd_and_hms(2021, 1, 23, 23, 59, 0).unwrap(),
            tree: ObjectId::null(gix::hash::Kind::Sha1),
            parent_count: 2,
        };
        assert_eq!(commit.date(), "2021-01-23");
        assert!(commit.is_merge());
    }

    #[test]
    fn missing_column_reads_as_zero() {
        let row = Row::new(
            "2021-01-23".into(),
            "abc".into(),
            BTreeMap::from([(".rs".to_string(), 4)]),
        );
        assert_eq!(row.lines(".rs"), 4);
        assert_eq!(row.lines(".go"), 0);
        assert_eq!(row.percent(".rs"), None);
    }

    #[test]
    fn percentages_are_rounded_to_two_decimals() {
        let row = Row::new(
            "2021-01-23".into(),
            "abc".into(),
            BTreeMap::from([
                (".yml".to_string(), 2),
                (".rs".to_string(), 11),
                (".md".to_string(), 0),
            ]),
        )
        .with_percentages();
        assert_eq!(row.percent(".yml"), Some(15.38));
        assert_eq!(row.percent(".rs"), Some(84.62));
        assert_eq!(row.percent(".md"), Some(0.0));
        assert_eq!(row.lines(".rs"), 11);
    }

    #[test]
    fn empty_row_is_zero_percent() {
        let row = Row::new(
            "2021-01-23".into(),
            "abc".into(),
            BTreeMap::from([(".rs".to_string(), 0), (".go".to_string(), 0)]),
        )
        .with_percentages();
        assert_eq!(row.percent(".rs"), Some(0.0));
        assert_eq!(row.percent(".go"), Some(0.0));
    }
}
