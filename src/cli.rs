use crate::trend::exec::ExecOptions;
use crate::trend::{OutputFormat, SelectOptions, TrendConfig};
use anyhow::Result;
use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gtrend")]
#[command(about = "Programming language line counts over the history of a git repository")]
#[command(after_help = "Examples:
  gtrend                      Trend of the three most common extensions
  gtrend .rs .go .m+.h        One column per language, .m and .h summed
  gtrend --list               Extensions of HEAD by line count
  gtrend --relative .rs .go   Share of each language in percent
  gtrend -o trends.json .py   Write a JSON document instead of TSV")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[arg(
        value_name = ".ext[+.ext...]",
        help = "Columns to count, e.g. .rs or .m+.h. Defaults to the top extensions"
    )]
    pub columns: Vec<String>,

    #[arg(long, help = "List extensions of the start commit by line count and exit")]
    pub list: bool,

    #[arg(short, long, help = "Write to this file, format picked from its extension")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, help = "Output format [default: tsv]")]
    pub format: Option<OutputFormat>,

    #[arg(long, help = "Do not show a progress bar")]
    pub no_progress: bool,

    #[arg(long, help = "Print line counting statistics when done")]
    pub benchmark: bool,

    #[arg(short, long, help = "Log debug output to stderr")]
    pub verbose: bool,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, env = "GIT_DIR", help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, default_value = "HEAD", help = "Commit to start walking back from")]
    pub start_commit: String,

    #[arg(long, default_value_t = 7, help = "Minimum days between analyzed commits")]
    pub min_interval_days: u32,

    #[arg(long, default_value_t = usize::MAX, hide_default_value = true, help = "Analyze at most this many commits")]
    pub max_commits: usize,

    #[arg(long, help = "Follow all parents of merges instead of only the first")]
    pub all_parents: bool,

    #[arg(long, help = "Never pick merge commits")]
    pub skip_merges: bool,

    #[arg(long, help = "Print each column's share of the row in percent")]
    pub relative: bool,

    #[arg(long, help = "Count every blob again instead of remembering line counts")]
    pub no_cache: bool,

    #[arg(long, help = "Path to a database that keeps line counts between runs")]
    pub cache_db: Option<PathBuf>,
}

impl CommonArgs {
    pub fn trend_config(&self, columns: Vec<String>) -> TrendConfig {
        TrendConfig {
            start_commit: self.start_commit.clone(),
            select: SelectOptions {
                min_interval_days: self.min_interval_days,
                max_commits: self.max_commits,
                all_parents: self.all_parents,
                skip_merges: self.skip_merges,
            },
            columns,
            relative: self.relative,
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        if self.list {
            return crate::trend::list(self.common, !self.no_progress);
        }

        crate::trend::exec(
            self.common,
            ExecOptions {
                columns: self.columns,
                output: self.output,
                format: self.format,
                progress: !self.no_progress,
                benchmark: self.benchmark,
            },
        )
    }
}
