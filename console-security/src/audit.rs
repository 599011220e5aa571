use std::collections::VecDeque;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::config::DEFAULT_AUDIT_CAPACITY;
use crate::config::SecurityConfig;
use crate::error::Result;
use crate::error::SecurityError;
use crate::guard::AccessGuard;
use crate::role::Action;
use crate::role::Resource;
use crate::session::SessionState;

/// Column width of the audit table's text fields.
pub const MAX_FIELD_LEN: usize = 255;

/// Event types the console records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    #[serde(rename = "Export")]
    Export,
    #[serde(rename = "Rename Export")]
    RenameExport,
    #[serde(rename = "Delete Export")]
    DeleteExport,
    #[serde(rename = "Create User")]
    CreateUser,
}

impl AuditEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditEventType::Export => "Export",
            AuditEventType::RenameExport => "Rename Export",
            AuditEventType::DeleteExport => "Delete Export",
            AuditEventType::CreateUser => "Create User",
        }
    }
}

/// A stored audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    pub event_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unix seconds on the wire.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

/// An audit event that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event_type: String,
    pub description: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

impl AuditRecord {
    pub fn new(event_type: &str, user_id: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            description: None,
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn export_created(user: &str, camera: &str) -> Self {
        Self::new(AuditEventType::Export.as_str(), user)
            .with_description(&format!("{user} created an export for {camera}"))
    }

    pub fn export_renamed(user: &str, new_name: &str) -> Self {
        Self::new(AuditEventType::RenameExport.as_str(), user)
            .with_description(&format!("Renamed export to {new_name}"))
    }

    pub fn export_deleted(user: &str) -> Self {
        Self::new(AuditEventType::DeleteExport.as_str(), user).with_description("Deleted export")
    }

    pub fn user_created(user: &str, new_user: &str) -> Self {
        Self::new(AuditEventType::CreateUser.as_str(), user)
            .with_description(&format!("{user} created user {new_user}"))
    }

    pub fn validate(&self) -> Result<()> {
        check_required("event_type", &self.event_type)?;
        check_required("user_id", &self.user_id)?;
        if let Some(description) = &self.description {
            check_length("description", description)?;
        }
        Ok(())
    }

    pub fn into_entry(self, id: u64) -> AuditEntry {
        AuditEntry {
            id,
            event_type: self.event_type,
            description: self.description,
            timestamp: self.timestamp,
            user_id: self.user_id,
        }
    }
}

fn check_required(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SecurityError::InvalidAuditField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    check_length(field, value)
}

fn check_length(field: &'static str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len > MAX_FIELD_LEN {
        return Err(SecurityError::InvalidAuditField {
            field,
            reason: format!("{len} characters exceeds {MAX_FIELD_LEN}"),
        });
    }
    Ok(())
}

/// Newest first: timestamp descending, ties broken by id descending.
pub fn sort_newest_first(entries: &mut [AuditEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

/// Bounded in-memory audit buffer. Oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    max_entries: usize,
    next_id: u64,
}

impl AuditLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
            next_id: 1,
        }
    }

    /// Buffer capped at the configured `audit_capacity`.
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.audit_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn record(&mut self, record: AuditRecord) -> Result<&AuditEntry> {
        if self.max_entries == 0 {
            return Err(SecurityError::InvalidConfig(
                "audit capacity is zero".to_string(),
            ));
        }
        record.validate()?;
        let entry = record.into_entry(self.next_id);
        self.next_id += 1;
        tracing::info!(
            id = entry.id,
            event_type = %entry.event_type,
            user = %entry.user_id,
            "audit event recorded"
        );
        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.entries
            .back()
            .ok_or_else(|| SecurityError::InvalidConfig("audit log is empty".to_string()))
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    pub fn recent(&self) -> Vec<AuditEntry> {
        let mut entries: Vec<AuditEntry> = self.entries.iter().cloned().collect();
        sort_newest_first(&mut entries);
        entries
    }

    /// [`AuditLog::recent`], gated on `logs:view`.
    pub fn list_for(
        &self,
        guard: &AccessGuard<'_>,
        session: &SessionState,
    ) -> Result<Vec<AuditEntry>> {
        guard.check(session, Resource::Logs, Action::View)?;
        Ok(self.recent())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::session::Profile;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_new_audit_log_is_empty() {
        let log = AuditLog::new(100);
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(log.recent().is_empty());
    }

    #[test]
    fn test_record_assigns_serial_ids() {
        let mut log = AuditLog::new(100);
        log.record(AuditRecord::export_created("alice", "driveway")).unwrap();
        log.record(AuditRecord::export_renamed("alice", "night shift")).unwrap();
        log.record(AuditRecord::export_deleted("bob")).unwrap();

        let ids: Vec<u64> = log.entries().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_event_descriptions() {
        let created = AuditRecord::export_created("alice", "driveway");
        assert_eq!(created.event_type, "Export");
        assert_eq!(
            created.description.as_deref(),
            Some("alice created an export for driveway")
        );

        let renamed = AuditRecord::export_renamed("alice", "porch");
        assert_eq!(renamed.event_type, "Rename Export");
        assert_eq!(renamed.description.as_deref(), Some("Renamed export to porch"));

        let deleted = AuditRecord::export_deleted("alice");
        assert_eq!(deleted.event_type, "Delete Export");
        assert_eq!(deleted.description.as_deref(), Some("Deleted export"));

        let user = AuditRecord::user_created("root", "viewer");
        assert_eq!(user.event_type, "Create User");
        assert_eq!(user.description.as_deref(), Some("root created user viewer"));
    }

    #[test]
    fn test_max_entries_cap() {
        let mut log = AuditLog::new(3);
        for n in 1..=4 {
            log.record(AuditRecord::new(&format!("event-{n}"), "user")).unwrap();
        }
        assert_eq!(log.len(), 3);
        let kept: Vec<&str> = log.entries().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kept, vec!["event-2", "event-3", "event-4"]);
        assert_eq!(log.entries().last().map(|e| e.id), Some(4));
    }

    #[test]
    fn test_configured_capacity_evicts_oldest() {
        let config = SecurityConfig::from_toml_str("audit_capacity = 2").unwrap();
        let mut log = AuditLog::from_config(&config);
        assert_eq!(log.capacity(), 2);

        log.record(AuditRecord::export_created("alice", "porch")).unwrap();
        log.record(AuditRecord::export_renamed("alice", "night")).unwrap();
        log.record(AuditRecord::export_deleted("alice")).unwrap();

        let ids: Vec<u64> = log.entries().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(AuditLog::default().capacity(), DEFAULT_AUDIT_CAPACITY);
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let mut log = AuditLog::new(10);
        log.record(AuditRecord::new("a", "u").at(at(200))).unwrap();
        log.record(AuditRecord::new("b", "u").at(at(100))).unwrap();
        log.record(AuditRecord::new("c", "u").at(at(200))).unwrap();

        let order: Vec<String> = log.recent().into_iter().map(|e| e.event_type).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_rejects_invalid_fields() {
        let mut log = AuditLog::new(10);
        assert!(matches!(
            log.record(AuditRecord::new("", "alice")),
            Err(SecurityError::InvalidAuditField { field: "event_type", .. })
        ));
        assert!(matches!(
            log.record(AuditRecord::new("Export", "")),
            Err(SecurityError::InvalidAuditField { field: "user_id", .. })
        ));
        let long = "x".repeat(MAX_FIELD_LEN + 1);
        assert!(matches!(
            log.record(AuditRecord::new("Export", "alice").with_description(&long)),
            Err(SecurityError::InvalidAuditField { field: "description", .. })
        ));
        assert!(log.is_empty());

        let edge = "y".repeat(MAX_FIELD_LEN);
        assert!(log.record(AuditRecord::new("Export", "alice").with_description(&edge)).is_ok());
    }

    #[test]
    fn test_zero_capacity_reports_error() {
        let mut log = AuditLog::new(0);
        assert!(log.record(AuditRecord::export_deleted("alice")).is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn test_list_requires_logs_view() {
        let mut log = AuditLog::new(10);
        log.record(AuditRecord::export_deleted("alice")).unwrap();
        let guard = AccessGuard::default();

        let user = SessionState::Authenticated(Profile::new("alice", Role::User));
        assert!(matches!(
            log.list_for(&guard, &user),
            Err(SecurityError::Denied { .. })
        ));

        let admin = SessionState::Authenticated(Profile::new("root", Role::Admin));
        assert_eq!(log.list_for(&guard, &admin).unwrap().len(), 1);
    }

    #[test]
    fn test_entry_json_uses_unix_seconds() {
        let entry = AuditRecord::export_deleted("alice").at(at(1_700_000_000)).into_entry(7);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["timestamp"], serde_json::json!(1_700_000_000));
        assert_eq!(json["event_type"], serde_json::json!("Delete Export"));

        let parsed: AuditEntry = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_event_type_serialization() {
        let json = serde_json::to_string(&AuditEventType::RenameExport).unwrap();
        assert_eq!(json, "\"Rename Export\"");
    }
}
