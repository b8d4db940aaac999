//! Upload registry: id allocation, storage and previews for uploaded tables.

use std::{fmt, sync::Arc};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    store::{generate_file_id, StoreError, StoredTable, TableStore},
    table::{CsvTable, PreviewRow},
    telemetry::StoreTelemetry,
};

/// Rows returned in previews unless configured otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;
const MAX_ID_ATTEMPTS: usize = 8;

/// Source of candidate file ids.
pub type IdSource = Arc<dyn Fn() -> String + Send + Sync>;

/// What the client sees about a stored table.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    /// Registry id.
    pub file_id: String,
    /// Client-side file name.
    #[serde(skip)]
    pub original_name: String,
    /// Column names.
    pub headers: Vec<String>,
    /// First rows as header → value records.
    pub preview: Vec<PreviewRow>,
    /// Total data rows.
    pub rows_count: usize,
}

/// Shared registry handed to request handlers.
pub struct UploadRegistry {
    store: TableStore,
    telemetry: Option<StoreTelemetry>,
    preview_rows: usize,
    id_source: IdSource,
}

impl fmt::Debug for UploadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRegistry")
            .field("tables", &self.store.len())
            .field("capacity", &self.store.capacity())
            .field("preview_rows", &self.preview_rows)
            .finish_non_exhaustive()
    }
}

impl Default for UploadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadRegistry {
    /// Registry over an unbounded store with default preview size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(TableStore::new())
    }

    /// Registry over an explicit store.
    #[must_use]
    pub fn with_store(store: TableStore) -> Self {
        Self {
            store,
            telemetry: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            id_source: Arc::new(|| generate_file_id(Utc::now(), &mut rand::thread_rng())),
        }
    }

    /// Attaches telemetry sinks.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: StoreTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Sets the preview length (at least one row).
    #[must_use]
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows.max(1);
        self
    }

    /// Replaces the id generator.
    #[must_use]
    pub fn with_id_source(mut self, source: IdSource) -> Self {
        self.id_source = source;
        self
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &TableStore {
        &self.store
    }

    /// Number of rows included in previews.
    #[must_use]
    pub const fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    /// Stores a parsed upload under a fresh id, retrying on id collisions.
    pub fn register(
        &self,
        original_name: &str,
        table: CsvTable,
    ) -> Result<UploadSummary, StoreError> {
        let stored = Arc::new(StoredTable::new(original_name, table));
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let candidate = (self.id_source)();
            match self.store.insert(candidate, Arc::clone(&stored)) {
                Ok(insertion) => {
                    let summary = self.summarize(&insertion.file_id, &stored);
                    self.log(
                        LogLevel::Info,
                        "table.stored",
                        json!({
                            "file_id": summary.file_id,
                            "original_name": original_name,
                            "rows": summary.rows_count,
                            "columns": summary.headers.len(),
                            "column_kinds": stored.table.column_kinds(),
                            "attempt": attempt,
                        }),
                    );
                    self.event(
                        "table.stored",
                        json!({ "file_id": summary.file_id, "rows": summary.rows_count }),
                    );
                    if let Some(evicted) = insertion.evicted {
                        self.log(LogLevel::Info, "table.evicted", json!({ "file_id": evicted }));
                        self.event("table.evicted", json!({ "file_id": evicted }));
                    }
                    return Ok(summary);
                }
                Err(StoreError::DuplicateId(id)) => {
                    self.log(
                        LogLevel::Warn,
                        "table.id_collision",
                        json!({ "file_id": id, "attempt": attempt }),
                    );
                }
                Err(other) => return Err(other),
            }
        }
        self.log(
            LogLevel::Error,
            "table.id_exhausted",
            json!({ "original_name": original_name, "attempts": MAX_ID_ATTEMPTS }),
        );
        Err(StoreError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    /// Summary of a stored table, if present.
    #[must_use]
    pub fn summary(&self, file_id: &str) -> Option<UploadSummary> {
        self.store
            .get(file_id)
            .map(|stored| self.summarize(file_id, &stored))
    }

    /// Raw access to a stored table.
    #[must_use]
    pub fn get(&self, file_id: &str) -> Option<Arc<StoredTable>> {
        self.store.get(file_id)
    }

    /// Number of stored tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether nothing has been uploaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn summarize(&self, file_id: &str, stored: &StoredTable) -> UploadSummary {
        UploadSummary {
            file_id: file_id.to_string(),
            original_name: stored.original_name.clone(),
            headers: stored.table.headers().to_vec(),
            preview: stored.table.preview(self.preview_rows),
            rows_count: stored.table.row_count(),
        }
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }

    fn event(&self, event_type: &str, payload: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            if let Err(err) = tel.event(event_type, payload) {
                tracing::warn!(error = %err, event_type, "table event not emitted");
            }
        }
    }
}
