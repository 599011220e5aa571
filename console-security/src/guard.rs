use crate::error::Result;
use crate::error::SecurityError;
use crate::permission::CapabilityMatrix;
use crate::permission::default_matrix;
use crate::role::Action;
use crate::role::Resource;
use crate::session::PendingProfilePolicy;
use crate::session::SessionState;

/// Binds a capability matrix to a pending-profile policy so callers can ask
/// questions about a session rather than a bare role.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard<'a> {
    matrix: &'a CapabilityMatrix,
    policy: PendingProfilePolicy,
}

impl<'a> AccessGuard<'a> {
    pub fn new(matrix: &'a CapabilityMatrix, policy: PendingProfilePolicy) -> Self {
        Self { matrix, policy }
    }

    pub fn matrix(&self) -> &'a CapabilityMatrix {
        self.matrix
    }

    pub fn policy(&self) -> PendingProfilePolicy {
        self.policy
    }

    pub fn allows(&self, session: &SessionState, resource: Resource, action: Action) -> bool {
        session
            .effective_role(self.policy)
            .is_some_and(|role| self.matrix.authorize(role, resource, action))
    }

    /// Like [`AccessGuard::allows`] but reports why access was refused.
    pub fn check(
        &self,
        session: &SessionState,
        resource: Resource,
        action: Action,
    ) -> Result<()> {
        let Some(role) = session.effective_role(self.policy) else {
            tracing::warn!(%resource, %action, "access check before profile resolved");
            return Err(SecurityError::Unauthenticated);
        };
        let allowed = self.matrix.authorize(role, resource, action);
        tracing::debug!(%role, %resource, %action, allowed, "access decision");
        if allowed {
            Ok(())
        } else {
            tracing::warn!(
                user = session.display_name(),
                %role,
                %resource,
                %action,
                "access denied"
            );
            Err(SecurityError::Denied {
                role,
                resource,
                action,
            })
        }
    }
}

impl Default for AccessGuard<'static> {
    fn default() -> Self {
        Self::new(default_matrix(), PendingProfilePolicy::default())
    }
}
