use crate::role::Action;
use crate::role::Resource;
use crate::role::Role;

/// Errors produced at the edges of the access model.
///
/// `authorize` itself never fails; these surface from explicit checks,
/// input validation and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("{role} is not permitted to {action} {resource}")]
    Denied {
        role: Role,
        resource: Resource,
        action: Action,
    },

    #[error("no profile has been resolved for this session")]
    Unauthenticated,

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid account: {0}")]
    InvalidAccount(String),

    #[error("invalid audit field `{field}`: {reason}")]
    InvalidAuditField { field: &'static str, reason: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SecurityError>;
