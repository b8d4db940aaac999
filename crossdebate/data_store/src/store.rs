//! Id allocation and storage for uploaded tables.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use rand::Rng;
use thiserror::Error;

use crate::table::CsvTable;

/// Registry failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An entry already exists under the id.
    #[error("table id already in use: {0}")]
    DuplicateId(String),
    /// Id generation kept colliding with stored ids.
    #[error("could not allocate a unique table id after {0} attempts")]
    IdSpaceExhausted(usize),
}

/// Generates `data_<unix-seconds>_<100..=999>.csv`.
pub fn generate_file_id<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    format!("data_{}_{}.csv", now.timestamp(), rng.gen_range(100..=999))
}

/// A parsed upload plus where it came from.
#[derive(Debug, Clone)]
pub struct StoredTable {
    /// Client-side file name.
    pub original_name: String,
    /// Arrival time.
    pub uploaded_at: DateTime<Utc>,
    /// Parsed contents.
    pub table: CsvTable,
}

impl StoredTable {
    /// Wraps a freshly parsed table.
    #[must_use]
    pub fn new(original_name: impl Into<String>, table: CsvTable) -> Self {
        Self {
            original_name: original_name.into(),
            uploaded_at: Utc::now(),
            table,
        }
    }
}

/// Result of a successful insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Id the table was stored under.
    pub file_id: String,
    /// Oldest id dropped to respect the capacity, if any.
    pub evicted: Option<String>,
}

/// Process-wide id → table map, safe for concurrent readers and writers.
///
/// Unbounded unless a capacity is given, in which case the oldest entry is evicted.
#[derive(Debug, Default)]
pub struct TableStore {
    capacity: Option<usize>,
    tables: RwLock<IndexMap<String, Arc<StoredTable>>>,
}

impl TableStore {
    /// Creates an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store keeping at most `capacity` tables.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            tables: RwLock::new(IndexMap::new()),
        }
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Stores a table under `id` and returns the id. Existing ids are never overwritten.
    pub fn put(&self, id: impl Into<String>, table: StoredTable) -> Result<String, StoreError> {
        self.insert(id, Arc::new(table))
            .map(|insertion| insertion.file_id)
    }

    /// Like `put` for an already shared table, also reporting an eviction.
    pub fn insert(
        &self,
        id: impl Into<String>,
        table: Arc<StoredTable>,
    ) -> Result<Insertion, StoreError> {
        let id = id.into();
        let mut tables = self.tables.write();
        if tables.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        tables.insert(id.clone(), table);
        let evicted = match self.capacity {
            Some(capacity) if tables.len() > capacity => {
                tables.shift_remove_index(0).map(|(old_id, _)| old_id)
            }
            _ => None,
        };
        Ok(Insertion {
            file_id: id,
            evicted,
        })
    }

    /// Looks up a table.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<StoredTable>> {
        self.tables.read().get(id).cloned()
    }

    /// Removes a table.
    pub fn remove(&self, id: &str) -> Option<Arc<StoredTable>> {
        self.tables.write().shift_remove(id)
    }

    /// Number of stored tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}
