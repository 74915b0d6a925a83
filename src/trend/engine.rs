use super::columns::ColumnMapper;
use super::count::{count_lines, BlobLineCache};
use super::output::Output;
use super::select::{select_commits, SelectOptions, Selection};
use super::survey::{ranked_extensions, top_default_columns};
use crate::error::{Result, TrendError};
use crate::git::HistorySource;
use crate::model::{CommitInfo, Row, RunStats};
use crate::progress::{NoopProgress, ProgressReporter};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// What to analyze. Mirrors the command line with its defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendConfig {
    pub start_commit: String,
    pub select: SelectOptions,
    /// Column specs like `.rs` or `.m+.h`. Empty means the top extensions of
    /// the start commit.
    pub columns: Vec<String>,
    /// Add the share of each column in percent to every row.
    pub relative: bool,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            start_commit: "HEAD".to_string(),
            select: SelectOptions::default(),
            columns: Vec::new(),
            relative: false,
        }
    }
}

/// Start commit and columns of a run, known before anything is written.
#[derive(Debug, Clone)]
pub struct Plan {
    pub start: CommitInfo,
    pub mapper: ColumnMapper,
}

/// Counts lines per column for commits of one repository, remembering blob
/// line counts across commits.
pub struct TrendEngine<'s, S: HistorySource> {
    source: &'s S,
    cache: BlobLineCache,
    progress: Box<dyn ProgressReporter>,
    stats: RunStats,
}

impl<'s, S: HistorySource> TrendEngine<'s, S> {
    pub fn new(source: &'s S, cache: BlobLineCache) -> Self {
        Self {
            source,
            cache,
            progress: Box::new(NoopProgress),
            stats: RunStats::default(),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            cache_hits: self.cache.hits(),
            blobs_scanned: self.cache.scans(),
            ..self.stats.clone()
        }
    }

    /// Persist new blob counts and hand back the final statistics.
    pub fn finish(mut self) -> Result<RunStats> {
        self.cache.flush()?;
        Ok(self.stats())
    }

    /// Sum lines per column over every file of `commit`. Each requested column
    /// is present, with zero if nothing matched.
    pub fn count_commit(
        &mut self,
        commit: &CommitInfo,
        mapper: &ColumnMapper,
    ) -> Result<BTreeMap<String, u64>> {
        let tally = self.tally(commit, mapper)?;
        self.stats.files_processed += tally.files;
        self.stats.lines_counted += tally.lines;
        Ok(tally.column_to_lines)
    }

    fn tally(&mut self, commit: &CommitInfo, mapper: &ColumnMapper) -> Result<Tally> {
        let mut tally = Tally {
            column_to_lines: mapper.labels().into_iter().map(|label| (label, 0)).collect(),
            files: 0,
            lines: 0,
        };

        let source = self.source;
        for (index, entry) in source.snapshot(commit)?.enumerate() {
            let entry = entry?;
            self.progress.file_processed(index + 1);

            let Some(column) = entry.extension().and_then(|ext| mapper.column_for(ext)) else {
                continue;
            };

            let lines = self
                .cache
                .lines_for(&entry.id, |id| source.with_content(id, count_lines))?;
            tally.files += 1;
            tally.lines += lines;

            match tally.column_to_lines.get_mut(column) {
                Some(total) => *total += lines,
                None => {
                    tally.column_to_lines.insert(column.to_string(), lines);
                }
            }
        }

        Ok(tally)
    }

    /// Lines per extension in one snapshot. Not part of the run statistics.
    pub fn survey(&mut self, commit: &CommitInfo) -> Result<HashMap<String, u64>> {
        self.progress.commit_started(1, 1);
        let result = self.tally(commit, &ColumnMapper::identity());
        self.progress.finish();
        Ok(result?.column_to_lines.into_iter().collect())
    }

    /// Resolve the start commit and the columns. Every configuration error
    /// surfaces here, before a row is produced.
    pub fn plan(&mut self, config: &TrendConfig) -> Result<Plan> {
        let requested = ColumnMapper::new(config.columns.as_slice())?;
        let start = self.source.resolve_revision(&config.start_commit)?;
        let mapper = if requested.is_identity() {
            self.default_columns(&start)?
        } else {
            requested
        };
        Ok(Plan { start, mapper })
    }

    /// The most popular extensions of `start`.
    fn default_columns(&mut self, start: &CommitInfo) -> Result<ColumnMapper> {
        let ranked = ranked_extensions(&self.survey(start)?);
        let defaults = top_default_columns(&ranked);
        if defaults.is_empty() {
            return Err(TrendError::NoColumns);
        }
        info!("No file extensions specified, using top extensions: {}", defaults.join(" "));
        ColumnMapper::new(defaults.as_slice())
    }

    /// Emit one row per commit, in the given order. A commit that fails
    /// midway produces no row and ends the run.
    pub fn run(
        &mut self,
        commits: &[CommitInfo],
        mapper: &ColumnMapper,
        relative: bool,
        output: &mut dyn Output,
    ) -> Result<()> {
        output.start(&mapper.labels())?;

        let result = self.emit_rows(commits, mapper, relative, output);
        self.progress.finish();
        result?;

        output.finish()
    }

    fn emit_rows(
        &mut self,
        commits: &[CommitInfo],
        mapper: &ColumnMapper,
        relative: bool,
        output: &mut dyn Output,
    ) -> Result<()> {
        let total = commits.len();
        for (index, commit) in commits.iter().enumerate() {
            self.progress.commit_started(index + 1, total);
            debug!("Counting lines in {} ({})", commit.id, commit.date());

            let column_to_lines = self.count_commit(commit, mapper)?;
            self.stats.commits_processed += 1;

            let mut row = Row::new(commit.date(), commit.id.to_string(), column_to_lines);
            if relative {
                row = row.with_percentages();
            }
            output.add_row(&row)?;
        }
        Ok(())
    }
}

struct Tally {
    column_to_lines: BTreeMap<String, u64>,
    files: usize,
    lines: u64,
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub columns: Vec<String>,
    pub selection: Selection,
}

/// Pick commits for a resolved [`Plan`] and stream rows to `output`.
pub fn execute<S: HistorySource>(
    engine: &mut TrendEngine<'_, S>,
    plan: &Plan,
    config: &TrendConfig,
    output: &mut dyn Output,
) -> Result<Analysis> {
    let selection = select_commits(engine.source, &plan.start, &config.select)?;
    engine.run(&selection.commits, &plan.mapper, config.relative, output)?;

    Ok(Analysis {
        columns: plan.mapper.labels(),
        selection,
    })
}

/// [`TrendEngine::plan`] followed by [`execute`].
pub fn analyze<S: HistorySource>(
    engine: &mut TrendEngine<'_, S>,
    config: &TrendConfig,
    output: &mut dyn Output,
) -> Result<Analysis> {
    let plan = engine.plan(config)?;
    execute(engine, &plan, config, output)
}
