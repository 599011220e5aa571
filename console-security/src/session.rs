use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::watch;

use crate::role::Role;

/// Profile of the signed-in account, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    /// Raw role string; values outside [`Role`] are kept as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Profile {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            role: Some(role.as_str().to_string()),
        }
    }

    /// Only an exact `admin` grants admin; anything else reads as user.
    pub fn resolved_role(&self) -> Role {
        match self.role.as_deref() {
            Some(role) if role == Role::Admin.as_str() => Role::Admin,
            _ => Role::User,
        }
    }
}

/// How permission checks behave while the profile fetch is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingProfilePolicy {
    /// Nothing is permitted until the profile resolves.
    DenyAll,
    /// Behave as the `user` role until the profile resolves.
    AsUser,
}

impl Default for PendingProfilePolicy {
    fn default() -> Self {
        Self::DenyAll
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Authentication succeeded but the profile has not arrived yet.
    #[default]
    Loading,
    /// The backend reported no signed-in account.
    Anonymous,
    Authenticated(Profile),
}

impl SessionState {
    /// Role used for permission checks, or `None` when every check must fail.
    pub fn effective_role(&self, policy: PendingProfilePolicy) -> Option<Role> {
        match self {
            SessionState::Authenticated(profile) => Some(profile.resolved_role()),
            SessionState::Anonymous => Some(Role::User),
            SessionState::Loading => match policy {
                PendingProfilePolicy::DenyAll => None,
                PendingProfilePolicy::AsUser => Some(Role::User),
            },
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            SessionState::Loading | SessionState::Anonymous => None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.profile()
            .map(|profile| profile.username.as_str())
            .unwrap_or("anonymous")
    }
}

/// Identifies one profile fetch so late responses can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Publishes the current [`SessionState`] to any number of readers.
///
/// Only the result of the most recently started fetch is applied;
/// completions carrying an older ticket are dropped.
pub struct SessionHandle {
    tx: watch::Sender<SessionState>,
    generation: AtomicU64,
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Loading);
        Self {
            tx,
            generation: AtomicU64::new(0),
        }
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Apply a finished profile fetch. `None` means the backend answered
    /// without a profile. Returns `false` if a newer fetch superseded it.
    /// Subscribers are only notified when the state actually changes.
    pub fn complete_fetch(&self, ticket: FetchTicket, profile: Option<Profile>) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|state| {
            let latest = self.generation.load(Ordering::SeqCst);
            if ticket.0 < latest {
                tracing::debug!(ticket = ticket.0, latest, "discarding stale profile fetch");
                return false;
            }
            applied = true;
            let next = match profile {
                Some(profile) => SessionState::Authenticated(profile),
                None => SessionState::Anonymous,
            };
            tracing::debug!(user = next.display_name(), "session profile resolved");
            let changed = *state != next;
            *state = next;
            changed
        });
        applied
    }

    /// Drop the profile and invalidate any fetch still in flight.
    pub fn sign_out(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("session signed out");
        self.tx.send_replace(SessionState::Anonymous);
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}
