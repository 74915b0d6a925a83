use super::count::BlobLineCache;
use super::engine::{execute, TrendEngine};
use super::output::OutputFormat;
use super::survey::ranked_extensions;
use crate::cache::LineStore;
use crate::cli::CommonArgs;
use crate::git::{GitRepo, HistorySource};
use crate::progress;
use anyhow::Context;
use console::style;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::warn;

pub struct ExecOptions {
    pub columns: Vec<String>,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub progress: bool,
    pub benchmark: bool,
}

pub fn exec(common: CommonArgs, options: ExecOptions) -> anyhow::Result<()> {
    let started = Instant::now();
    let config = common.trend_config(options.columns);

    let format = match (options.format, &options.output) {
        (Some(format), _) => format,
        (None, Some(path)) => OutputFormat::from_file_name(&path.to_string_lossy())
            .context("Cannot pick an output format, use --format")?,
        (None, None) => OutputFormat::Tsv,
    };

    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let cache = line_cache(&common)?;
    let mut engine =
        TrendEngine::new(&repo, cache).with_progress(progress::reporter(options.progress));

    // Nothing is created on disk until the configuration is known to be good
    let plan = engine.plan(&config).context("Failed to compute line trends")?;

    let dest: Box<dyn Write> = match &options.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let mut output = format.into_output(
        dest,
        repo.path().display().to_string(),
        config.start_commit.clone(),
    );

    execute(&mut engine, &plan, &config, output.as_mut())
        .context("Failed to compute line trends")?;
    let stats = engine.finish().context("Failed to save the line cache")?;

    if let Some(path) = &options.output {
        eprintln!("Wrote output to file: {}", style(path.display()).green());
    }
    if options.benchmark {
        eprintln!("{}", stats.report(started.elapsed()));
    }

    Ok(())
}

/// Print every extension of the start commit with its line count.
pub fn list(common: CommonArgs, show_progress: bool) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let cache = line_cache(&common)?;
    let start = repo
        .resolve_revision(&common.start_commit)
        .context("Failed to resolve start commit")?;

    let mut engine = TrendEngine::new(&repo, cache).with_progress(progress::reporter(show_progress));
    let ranked = ranked_extensions(&engine.survey(&start).context("Failed to survey extensions")?);
    engine.finish().context("Failed to save the line cache")?;

    println!(
        "{} {}",
        style("Extensions in").bold(),
        style(start.id.to_hex_with_len(12)).yellow()
    );
    let width = ranked.first().map_or(1, |(_, lines)| lines.to_string().len());
    for (ext, lines) in &ranked {
        println!("{:>width$}  {}", lines, style(ext).cyan());
    }

    Ok(())
}

fn line_cache(common: &CommonArgs) -> anyhow::Result<BlobLineCache> {
    if common.no_cache {
        if common.cache_db.is_some() {
            warn!("--cache-db has no effect together with --no-cache");
        }
        return Ok(BlobLineCache::disabled());
    }

    let cache = BlobLineCache::new();
    match &common.cache_db {
        Some(path) => {
            let store = LineStore::open(path)
                .with_context(|| format!("Failed to open cache database {}", path.display()))?;
            Ok(cache.with_store(store))
        }
        None => Ok(cache),
    }
}
