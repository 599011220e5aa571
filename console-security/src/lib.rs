pub mod account;
pub mod audit;
pub mod config;
pub mod error;
pub mod guard;
pub mod permission;
pub mod role;
pub mod session;
pub mod views;

// Re-export key types for convenience.
pub use account::{NewAccount, validate_username};
pub use audit::{AuditEntry, AuditEventType, AuditLog, AuditRecord, sort_newest_first};
pub use config::SecurityConfig;
pub use error::{Result, SecurityError};
pub use guard::AccessGuard;
pub use permission::{CapabilityMatrix, Permission, authorize, authorize_named, default_matrix};
pub use role::{Action, Resource, Role};
pub use session::{FetchTicket, PendingProfilePolicy, Profile, SessionHandle, SessionState};
pub use views::{MenuEntry, SettingsView, visible_menu, visible_views};
