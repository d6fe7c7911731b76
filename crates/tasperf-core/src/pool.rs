//! # Shared Entry Pool
//!
//! Append-only collection of log entry identifiers bridging the signing and
//! verification workloads. Signing VUs append; verifying VUs sample a
//! uniformly random element.
//!
//! ## Concurrency Invariant
//!
//! The backing `Vec` sits behind a `parking_lot::RwLock`. An append takes
//! the write lock for the duration of one `push`, so a reader either sees
//! the complete identifier or does not see it at all. Index selection and
//! element read happen under the same read guard, so a reader can never
//! observe an out-of-bounds index. The lock is never held across `.await`.
//!
//! Growth is monotonic: there is no removal and no compaction.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;

use crate::error::PoolError;
use crate::identity::EntryUuid;

/// Thread-safe, cloneable handle to an append-only identifier pool.
#[derive(Debug, Default)]
pub struct EntryPool {
    entries: Arc<RwLock<Vec<EntryUuid>>>,
}

impl Clone for EntryPool {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl EntryPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool pre-populated with `ids`.
    pub fn from_entries(ids: impl IntoIterator<Item = EntryUuid>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(ids.into_iter().collect())),
        }
    }

    /// Append one identifier. Returns the pool size after the append.
    pub fn append(&self, id: EntryUuid) -> usize {
        let mut guard = self.entries.write();
        guard.push(id);
        guard.len()
    }

    /// Draw a uniformly random identifier, or `None` while the pool is empty.
    pub fn sample_random(&self) -> Option<EntryUuid> {
        self.sample_with(&mut rand::thread_rng())
    }

    /// Draw a uniformly random identifier using the supplied generator.
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<EntryUuid> {
        let guard = self.entries.read();
        if guard.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..guard.len());
        guard.get(index).cloned()
    }

    /// Number of identifiers appended so far.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no identifier has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of all identifiers in append order.
    pub fn snapshot(&self) -> Vec<EntryUuid> {
        self.entries.read().clone()
    }

    /// Parse a newline-delimited identifier list. Blank lines and
    /// surrounding whitespace are ignored.
    pub fn from_reader<R: Read>(reader: R) -> std::io::Result<Self> {
        let mut ids = Vec::new();
        for line in BufReader::new(reader).lines() {
            if let Some(id) = EntryUuid::new(line?) {
                ids.push(id);
            }
        }
        Ok(Self::from_entries(ids))
    }

    /// Load an identifier file written by a previous signing run.
    pub fn load(path: &Path) -> Result<Self, PoolError> {
        let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let pool = Self::from_reader(file).map_err(|e| PoolError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), entries = pool.len(), "loaded identifier file");
        Ok(pool)
    }

    /// Write every identifier, one per line, replacing `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), PoolError> {
        let io_err = |e| PoolError::Io {
            path: path.display().to_string(),
            source: e,
        };
        let snapshot = self.snapshot();
        let mut file = std::io::BufWriter::new(std::fs::File::create(path).map_err(io_err)?);
        for id in &snapshot {
            writeln!(file, "{id}").map_err(io_err)?;
        }
        file.flush().map_err(io_err)
    }
}
