pub mod export;
pub mod store;

// Re-export key types for convenience.
pub use export::{ExportFormat, export_audits, import_audits};
pub use store::{AuditStore, JsonFileStore, PersistError};
