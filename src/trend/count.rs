use crate::cache::LineStore;
use crate::error::Result;
use gix::ObjectId;
use std::collections::HashMap;
use tracing::debug;

/// Number of `\n` bytes in `content`. Works on raw bytes, so the encoding of
/// the file does not matter and binary content gets a stable answer too.
pub fn count_lines(content: &[u8]) -> u64 {
    memchr::memchr_iter(b'\n', content).count() as u64
}

/// Line counts keyed by blob id.
///
/// Blobs are immutable, so a count never goes stale and most files are shared
/// between sampled commits. When disabled every lookup recomputes.
pub struct BlobLineCache {
    lines: Option<HashMap<ObjectId, u64>>,
    store: Option<LineStore>,
    unsaved: Vec<(ObjectId, u64)>,
    hits: usize,
    scans: usize,
}

impl BlobLineCache {
    pub fn new() -> Self {
        Self {
            lines: Some(HashMap::new()),
            store: None,
            unsaved: Vec::new(),
            hits: 0,
            scans: 0,
        }
    }

    pub fn disabled() -> Self {
        Self {
            lines: None,
            ..Self::new()
        }
    }

    /// Back the in-memory map with a persistent store. Has no effect on a
    /// disabled cache.
    pub fn with_store(mut self, store: LineStore) -> Self {
        if self.is_enabled() {
            self.store = Some(store);
        }
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.lines.is_some()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lines.as_ref().map_or(0, HashMap::len)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    /// How many times `compute` ran, i.e. how many blobs were read and scanned.
    pub fn scans(&self) -> usize {
        self.scans
    }

    /// Line count of blob `id`. `compute` is only called when the count is not
    /// known yet; whatever content it reads must not outlive the call.
    pub fn lines_for(
        &mut self,
        id: &ObjectId,
        compute: impl FnOnce(&ObjectId) -> Result<u64>,
    ) -> Result<u64> {
        let Some(lines) = self.lines.as_mut() else {
            self.scans += 1;
            return compute(id);
        };

        if let Some(&known) = lines.get(id) {
            self.hits += 1;
            return Ok(known);
        }

        if let Some(store) = &self.store {
            if let Some(stored) = store.get(id)? {
                lines.insert(*id, stored);
                self.hits += 1;
                return Ok(stored);
            }
        }

        let counted = compute(id)?;
        self.scans += 1;
        lines.insert(*id, counted);
        if self.store.is_some() {
            self.unsaved.push((*id, counted));
        }
        Ok(counted)
    }

    /// Write counts computed during this run to the persistent store.
    pub fn flush(&mut self) -> Result<usize> {
        let Some(store) = self.store.as_mut() else {
            return Ok(0);
        };
        let written = store.insert_many(&self.unsaved)?;
        debug!("Persisted {written} blob line counts");
        self.unsaved.clear();
        Ok(written)
    }
}

impl Default for BlobLineCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrendError;
    use pretty_assertions::assert_eq;

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_hex(format!("{n:040x}").as_bytes()).unwrap()
    }

    #[test]
    fn counts_newline_bytes_only() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"no newline"), 0);
        assert_eq!(count_lines(b"a\nb\n"), 2);
        assert_eq!(count_lines(b"a\nb"), 1);
        assert_eq!(count_lines(b"crlf\r\nline\r\n"), 2);
        assert_eq!(count_lines(&[0, 10, 255, 10, 10]), 3);
    }

    #[test]
    fn computes_each_blob_once() {
        let mut cache = BlobLineCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let lines = cache
                .lines_for(&oid(1), |_| {
                    calls += 1;
                    Ok(count_lines(b"1\n2\n3\n"))
                })
                .unwrap();
            assert_eq!(lines, 3);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.scans(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled_cache_always_recomputes() {
        let mut cache = BlobLineCache::disabled();
        let mut calls = 0;
        for _ in 0..3 {
            cache
                .lines_for(&oid(1), |_| {
                    calls += 1;
                    Ok(7)
                })
                .unwrap();
        }
        assert_eq!(calls, 3);
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn failed_compute_is_not_cached() {
        let mut cache = BlobLineCache::new();
        let err = cache.lines_for(&oid(2), |id| {
            Err(TrendError::Unreadable {
                id: id.to_string(),
                reason: "gone".into(),
            })
        });
        assert!(err.is_err());
        assert_eq!(cache.lines_for(&oid(2), |_| Ok(5)).unwrap(), 5);
    }

    #[test]
    fn persisted_counts_survive_a_new_cache() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("lines.db");

        let mut first = BlobLineCache::new().with_store(LineStore::open(&db).unwrap());
        first.lines_for(&oid(3), |_| Ok(42)).unwrap();
        assert_eq!(first.flush().unwrap(), 1);

        let mut second = BlobLineCache::new().with_store(LineStore::open(&db).unwrap());
        let lines = second
            .lines_for(&oid(3), |_| panic!("count should come from the store"))
            .unwrap();
        assert_eq!(lines, 42);
        assert_eq!(second.scans(), 0);
    }
}
