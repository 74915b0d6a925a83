//! In-memory [`HistorySource`] for unit tests.

use super::{History, HistorySource, HistoryStep, Snapshot};
use crate::error::{Result, TrendError};
use crate::model::{CommitInfo, FileEntry};
use chrono::{DateTime, Duration, TimeZone, Utc};
use gix::bstr::BString;
use gix::ObjectId;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

struct MemCommit {
    info: CommitInfo,
    parents: Vec<ObjectId>,
}

#[derive(Default)]
pub struct MemoryRepo {
    commits: HashMap<ObjectId, MemCommit>,
    head: Option<ObjectId>,
    refs: HashMap<String, ObjectId>,
    trees: HashMap<ObjectId, Vec<(String, ObjectId)>>,
    blobs: HashMap<ObjectId, Vec<u8>>,
    blob_ids: HashMap<Vec<u8>, ObjectId>,
    unreadable: HashSet<ObjectId>,
    reads: RefCell<HashMap<ObjectId, usize>>,
    next_id: u64,
}

/// `n` lines of text. Leaked so fixtures can be plain `&str` tuples.
pub fn lines(n: usize) -> &'static str {
    Box::leak("x\n".repeat(n).into_boxed_str())
}

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).unwrap() + Duration::days(n)
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> ObjectId {
        self.next_id += 1;
        ObjectId::from_hex(format!("{:040x}", self.next_id).as_bytes()).unwrap()
    }

    fn blob(&mut self, content: &[u8]) -> ObjectId {
        if let Some(id) = self.blob_ids.get(content) {
            return *id;
        }
        let id = self.fresh_id();
        self.blob_ids.insert(content.to_vec(), id);
        self.blobs.insert(id, content.to_vec());
        id
    }

    fn add_commit(
        &mut self,
        author_date: DateTime<Utc>,
        parents: Vec<ObjectId>,
        files: &[(&str, &str)],
    ) -> ObjectId {
        let entries = files
            .iter()
            .map(|(path, content)| (path.to_string(), self.blob(content.as_bytes())))
            .collect();
        let tree = self.fresh_id();
        self.trees.insert(tree, entries);

        let id = self.fresh_id();
        let info = CommitInfo {
            id,
            author_date,
            tree,
            parent_count: parents.len(),
        };
        self.commits.insert(id, MemCommit { info, parents });
        self.head = Some(id);
        id
    }

    /// Commit on top of the current head.
    pub fn commit(&mut self, days: i64, files: &[(&str, &str)]) -> ObjectId {
        self.commit_at(day(days), files)
    }

    pub fn commit_at(&mut self, author_date: DateTime<Utc>, files: &[(&str, &str)]) -> ObjectId {
        let parents = self.head.into_iter().collect();
        self.add_commit(author_date, parents, files)
    }

    /// Commit with an explicit parent list, e.g. a merge. Becomes the head.
    pub fn commit_with_parents(
        &mut self,
        days: i64,
        parents: Vec<ObjectId>,
        files: &[(&str, &str)],
    ) -> ObjectId {
        self.add_commit(day(days), parents, files)
    }

    /// Root commit whose parent is not present, like the boundary of a
    /// shallow clone.
    pub fn shallow_root(&mut self, days: i64, files: &[(&str, &str)]) -> ObjectId {
        let missing = self.fresh_id();
        self.add_commit(day(days), vec![missing], files)
    }

    pub fn set_head(&mut self, id: ObjectId) {
        self.head = Some(id);
    }

    pub fn tag(&mut self, name: &str, id: ObjectId) {
        self.refs.insert(name.to_string(), id);
    }

    pub fn make_unreadable(&mut self, content: &str) {
        let id = self.blob(content.as_bytes());
        self.unreadable.insert(id);
    }

    /// How often the content of any blob was read.
    pub fn total_reads(&self) -> usize {
        self.reads.borrow().values().sum()
    }

    pub fn max_reads_per_blob(&self) -> usize {
        self.reads.borrow().values().copied().max().unwrap_or(0)
    }
}

impl HistorySource for MemoryRepo {
    fn resolve_revision(&self, spec: &str) -> Result<CommitInfo> {
        let id = match spec {
            "HEAD" => self.head,
            _ => self.refs.get(spec).copied(),
        };
        id.and_then(|id| self.commits.get(&id))
            .map(|c| c.info.clone())
            .ok_or_else(|| TrendError::RevisionNotFound(spec.to_string()))
    }

    fn history<'a>(&'a self, start: &CommitInfo, all_parents: bool) -> Result<History<'a>> {
        let mut steps = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![start.id];
        let mut visited = Vec::new();

        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(commit) = self.commits.get(&id) else {
                steps.push(HistoryStep::Incomplete(format!("object {id} not found")));
                break;
            };
            visited.push(commit.info.clone());
            if all_parents {
                pending.extend(commit.parents.iter().copied());
            } else {
                pending.extend(commit.parents.first().copied());
            }
        }

        visited.sort_by(|a, b| b.author_date.cmp(&a.author_date));
        let mut all: Vec<HistoryStep> = visited.into_iter().map(HistoryStep::Commit).collect();
        all.extend(steps);
        Ok(Box::new(all.into_iter()))
    }

    fn snapshot<'a>(&'a self, commit: &CommitInfo) -> Result<Snapshot<'a>> {
        let entries = self
            .trees
            .get(&commit.tree)
            .ok_or_else(|| TrendError::GitRepo(format!("tree {} not found", commit.tree)))?;
        Ok(Box::new(entries.iter().map(|(path, id)| {
            Ok(FileEntry {
                path: BString::from(path.as_str()),
                id: *id,
            })
        })))
    }

    fn with_content<R>(&self, id: &ObjectId, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        if self.unreadable.contains(id) {
            return Err(TrendError::Unreadable {
                id: id.to_string(),
                reason: "corrupt object".to_string(),
            });
        }
        let data = self.blobs.get(id).ok_or_else(|| TrendError::Unreadable {
            id: id.to_string(),
            reason: "not found".to_string(),
        })?;
        *self.reads.borrow_mut().entry(*id).or_insert(0) += 1;
        Ok(f(data))
    }
}
