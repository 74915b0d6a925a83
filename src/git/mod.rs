//! Access to repository history, snapshots and blob content.
//!
//! The trend engine only talks to [`HistorySource`]. [`GitRepo`] implements it
//! on top of `gix`; tests use an in-memory repository.

mod repo;

#[cfg(test)]
pub mod memory;

pub use repo::GitRepo;

use crate::error::Result;
use crate::model::{CommitInfo, FileEntry};
use gix::ObjectId;

/// One step of a history walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStep {
    Commit(CommitInfo),
    /// The walk could not continue, e.g. at the boundary of a shallow clone.
    /// Nothing follows this step.
    Incomplete(String),
}

pub type History<'a> = Box<dyn Iterator<Item = HistoryStep> + 'a>;
pub type Snapshot<'a> = Box<dyn Iterator<Item = Result<FileEntry>> + 'a>;

pub trait HistorySource {
    /// Resolve a revision such as `HEAD`, a branch, a tag or a hash to a commit.
    fn resolve_revision(&self, spec: &str) -> Result<CommitInfo>;

    /// Commits reachable from `start`, newest first, each visited once.
    /// With `all_parents == false` only first parents are followed.
    fn history<'a>(&'a self, start: &CommitInfo, all_parents: bool) -> Result<History<'a>>;

    /// Every file reachable from the commit's root tree, subtrees and
    /// submodules excluded. Order is unspecified.
    fn snapshot<'a>(&'a self, commit: &CommitInfo) -> Result<Snapshot<'a>>;

    /// Run `f` over the content of blob `id`. The content is only borrowed for
    /// the duration of the call.
    fn with_content<R>(&self, id: &ObjectId, f: impl FnOnce(&[u8]) -> R) -> Result<R>;
}
