//! DeskPort Core - account export and import engine
//!
//! This crate provides the migration pipeline for DeskPort: snapshot
//! document types, the account exporter, the dependency-ordered importer,
//! id remapping, and progress reporting.

pub mod export;
pub mod import;
pub mod progress;
pub mod remap;
pub mod report;
pub mod snapshot;

pub use export::{export_account, write_snapshot, ExportOptions, ExportSummary};
pub use import::{import_snapshot, ImportOptions};
pub use progress::{MigrationEvent, NoopProgress, ProgressReporter, TracingProgress};
pub use remap::IdMap;
pub use report::ImportReport;
pub use snapshot::Snapshot;
