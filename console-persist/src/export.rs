use std::fmt::Write as _;

use console_security::AuditEntry;
use serde::Deserialize;
use serde::Serialize;

use crate::store::PersistError;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Markdown,
}

/// Render audit entries in the given format, preserving their order.
pub fn export_audits(entries: &[AuditEntry], format: ExportFormat) -> Result<String, PersistError> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(entries)
            .map_err(|e| PersistError::Serialization(e.to_string())),
        ExportFormat::Markdown => {
            let mut md = String::new();
            md.push_str("# Audit Logs\n\n");
            let _ = writeln!(md, "**Entries**: {}\n", entries.len());
            md.push_str("| Id | Event | Description | Time (UTC) | User |\n");
            md.push_str("|----|-------|-------------|------------|------|\n");
            for entry in entries {
                let _ = writeln!(
                    md,
                    "| {} | {} | {} | {} | {} |",
                    entry.id,
                    escape_cell(&entry.event_type),
                    escape_cell(entry.description.as_deref().unwrap_or("")),
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    escape_cell(&entry.user_id),
                );
            }
            Ok(md)
        }
    }
}

fn escape_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

/// Parse entries previously written by [`export_audits`] as JSON.
pub fn import_audits(json: &str) -> Result<Vec<AuditEntry>, PersistError> {
    serde_json::from_str(json).map_err(|e| PersistError::Serialization(e.to_string()))
}
