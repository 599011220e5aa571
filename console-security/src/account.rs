use serde::Deserialize;
use serde::Serialize;

use crate::audit::AuditRecord;
use crate::error::Result;
use crate::error::SecurityError;
use crate::guard::AccessGuard;
use crate::role::Action;
use crate::role::Resource;
use crate::role::Role;
use crate::session::SessionState;

/// Request to create a console account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl NewAccount {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::default(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)
    }

    /// Checks that `session` may create this account and returns the
    /// `Create User` audit record to store once the account exists.
    pub fn authorize_create(
        &self,
        guard: &AccessGuard<'_>,
        session: &SessionState,
    ) -> Result<AuditRecord> {
        self.validate()?;
        guard.check(session, Resource::Users, Action::Create)?;
        tracing::info!(
            by = session.display_name(),
            username = %self.username,
            role = %self.role,
            "account creation authorized"
        );
        Ok(AuditRecord::user_created(session.display_name(), &self.username))
    }
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(SecurityError::InvalidAccount(
            "username must not be empty".to_string(),
        ));
    }
    if !username.chars().all(is_username_char) {
        return Err(SecurityError::InvalidAccount(
            "username may only include letters, numbers, . or _".to_string(),
        ));
    }
    Ok(())
}
