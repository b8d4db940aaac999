#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! CrossDebate data store: parses uploaded CSV files, keeps them in an in-process
//! registry keyed by generated ids and serves previews of what was stored.

pub mod store;
pub mod table;

/// Telemetry sinks.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Upload registry.
#[path = "../main.rs"]
pub mod registry;

pub use registry::{IdSource, UploadRegistry, UploadSummary, DEFAULT_PREVIEW_ROWS};
pub use store::{generate_file_id, Insertion, StoreError, StoredTable, TableStore};
pub use table::{CellValue, ColumnKind, CsvTable, PreviewRow, TableError};
pub use telemetry::{StoreTelemetry, StoreTelemetryBuilder};
