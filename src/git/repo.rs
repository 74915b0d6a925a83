use super::{History, HistorySource, HistoryStep, Snapshot};
use crate::error::{Result, TrendError};
use crate::model::{CommitInfo, FileEntry};
use chrono::DateTime;
use gix::bstr::BString;
use gix::revision::walk::Sorting;
use gix::{discover, ObjectId, Repository};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        debug!("Opened git repository at {}", path.display());

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit_info(&self, id: ObjectId) -> Result<CommitInfo> {
        let commit = self.repo.find_commit(id)?;
        let secs = commit.author()?.seconds();
        let author_date = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| TrendError::InvalidDate(format!("Invalid timestamp: {secs}")))?;
        let tree = commit.tree_id()?.detach();

        Ok(CommitInfo {
            id,
            author_date,
            tree,
            parent_count: commit.parent_ids().count(),
        })
    }
}

impl HistorySource for GitRepo {
    fn resolve_revision(&self, spec: &str) -> Result<CommitInfo> {
        let id = self
            .repo
            .rev_parse_single(spec)
            .map_err(|e| TrendError::RevisionNotFound(format!("'{spec}': {e}")))?;

        let commit = id
            .object()?
            .peel_to_commit()
            .map_err(|e| TrendError::RevisionNotFound(format!("'{spec}' is not a commit: {e}")))?;

        self.commit_info(commit.id)
    }

    fn history<'a>(&'a self, start: &CommitInfo, all_parents: bool) -> Result<History<'a>> {
        let mut platform = self
            .repo
            .rev_walk([start.id])
            .sorting(Sorting::ByCommitTime(Default::default()));
        if !all_parents {
            platform = platform.first_parent_only();
        }
        let mut walk = platform.all()?;

        // gix stops quietly at the grafted commits of a shallow clone
        let shallow: HashSet<ObjectId> = self
            .repo
            .shallow_commits()
            .map_err(|e| TrendError::GitRepo(format!("Cannot read shallow commits: {e}")))?
            .map(|commits| commits.iter().copied().collect())
            .unwrap_or_default();

        // Missing objects show up at the edge of partial clones. A shallow
        // boundary is reported after everything that could still be walked.
        let mut boundary: Option<String> = None;
        let mut ended = false;
        Ok(Box::new(std::iter::from_fn(move || {
            if ended {
                return None;
            }
            let step = match walk.next() {
                Some(Ok(info)) => match self.commit_info(info.id) {
                    Ok(commit) => {
                        if boundary.is_none()
                            && commit.parent_count > 0
                            && shallow.contains(&commit.id)
                        {
                            boundary = Some(format!("shallow boundary at {}", commit.id));
                        }
                        HistoryStep::Commit(commit)
                    }
                    Err(e) => HistoryStep::Incomplete(e.to_string()),
                },
                Some(Err(e)) => HistoryStep::Incomplete(e.to_string()),
                None => HistoryStep::Incomplete(boundary.take()?),
            };
            ended = matches!(step, HistoryStep::Incomplete(_));
            Some(step)
        })))
    }

    fn snapshot<'a>(&'a self, commit: &CommitInfo) -> Result<Snapshot<'a>> {
        Ok(Box::new(TreeFiles {
            repo: &self.repo,
            trees: vec![(BString::default(), commit.tree)],
            files: Vec::new().into_iter(),
        }))
    }

    fn with_content<R>(&self, id: &ObjectId, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let blob = self.repo.find_object(*id).map_err(|e| TrendError::Unreadable {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(f(&blob.data))
    }
}

/// Depth first walk over a commit tree with an explicit stack of pending
/// trees. Only the entries of the most recently decoded tree are buffered.
struct TreeFiles<'repo> {
    repo: &'repo Repository,
    trees: Vec<(BString, ObjectId)>,
    files: std::vec::IntoIter<FileEntry>,
}

impl TreeFiles<'_> {
    fn expand(&mut self, prefix: &[u8], tree_id: ObjectId) -> Result<()> {
        let repo = self.repo;
        let tree = repo.find_tree(tree_id)?;
        let decoded = tree.decode()?;

        let mut files = Vec::new();
        for entry in &decoded.entries {
            let path = join_path(prefix, entry.filename);
            if entry.mode.is_tree() {
                self.trees.push((path, entry.oid.to_owned()));
            } else if entry.mode.is_blob() || entry.mode.is_link() {
                files.push(FileEntry {
                    path,
                    id: entry.oid.to_owned(),
                });
            }
        }
        self.files = files.into_iter();
        Ok(())
    }
}

impl Iterator for TreeFiles<'_> {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(file) = self.files.next() {
                return Some(Ok(file));
            }
            let (prefix, tree_id) = self.trees.pop()?;
            if let Err(e) = self.expand(&prefix, tree_id) {
                self.trees.clear();
                return Some(Err(e));
            }
        }
    }
}

fn join_path(prefix: &[u8], name: &[u8]) -> BString {
    let mut path = BString::from(prefix);
    if !path.is_empty() {
        path.push(b'/');
    }
    path.extend_from_slice(name);
    path
}
