use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use console_security::AccessGuard;
use console_security::Action;
use console_security::AuditEntry;
use console_security::AuditRecord;
use console_security::Resource;
use console_security::SecurityError;
use console_security::SessionState;
use console_security::sort_newest_first;
use fs2::FileExt;
use tempfile::NamedTempFile;

/// Trait for audit storage backends.
pub trait AuditStore {
    /// Validate and persist `record`, returning it with its assigned id.
    fn append(&self, record: AuditRecord) -> Result<AuditEntry, PersistError>;
    /// All stored entries, newest first.
    fn list(&self) -> Result<Vec<AuditEntry>, PersistError>;
    fn clear(&self) -> Result<(), PersistError>;

    /// [`AuditStore::list`] for a session holding `logs:view`.
    fn list_for(
        &self,
        guard: &AccessGuard<'_>,
        session: &SessionState,
    ) -> Result<Vec<AuditEntry>, PersistError> {
        guard.check(session, Resource::Logs, Action::View)?;
        self.list()
    }
}

/// Audit trail kept as a single JSON array on disk.
///
/// Writers serialize on an exclusive lock held on `<path>.lock`, so
/// concurrent processes appending to the same file never lose entries or
/// reuse ids.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Blocks until this process owns the store. Released when the
    /// returned handle is dropped.
    fn lock(&self) -> Result<File, PersistError> {
        std::fs::create_dir_all(self.dir()).map_err(|e| PersistError::Io(e.to_string()))?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| PersistError::Io(e.to_string()))?;
        file.lock_exclusive()
            .map_err(|e| PersistError::Io(e.to_string()))?;
        Ok(file)
    }

    fn read_all(&self) -> Result<Vec<AuditEntry>, PersistError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data =
            std::fs::read_to_string(&self.path).map_err(|e| PersistError::Io(e.to_string()))?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|e| PersistError::Serialization(e.to_string()))
    }

    fn write_all(&self, entries: &[AuditEntry]) -> Result<(), PersistError> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| PersistError::Serialization(e.to_string()))?;
        // Replace the file in one step so readers never see a partial array.
        let mut tmp =
            NamedTempFile::new_in(self.dir()).map_err(|e| PersistError::Io(e.to_string()))?;
        tmp.write_all(&json)
            .map_err(|e| PersistError::Io(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| PersistError::Io(e.error.to_string()))?;
        Ok(())
    }
}

impl AuditStore for JsonFileStore {
    fn append(&self, record: AuditRecord) -> Result<AuditEntry, PersistError> {
        record.validate()?;
        let _lock = self.lock()?;
        let mut entries = self.read_all()?;
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let entry = record.into_entry(next_id);
        entries.push(entry.clone());
        self.write_all(&entries)?;
        tracing::info!(
            id = entry.id,
            event_type = %entry.event_type,
            path = %self.path.display(),
            "audit event persisted"
        );
        Ok(entry)
    }

    fn list(&self) -> Result<Vec<AuditEntry>, PersistError> {
        let mut entries = self.read_all()?;
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    fn clear(&self) -> Result<(), PersistError> {
        let _lock = self.lock()?;
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| PersistError::Io(e.to_string()))?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Security(#[from] SecurityError),
}
