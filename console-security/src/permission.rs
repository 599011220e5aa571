use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;

use crate::role::Action;
use crate::role::Resource;
use crate::role::Role;

/// Capabilities one role holds on one resource.
///
/// `download` is optional; an absent value never grants access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub view: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<bool>,
}

impl Permission {
    pub const FULL: Permission = Permission {
        view: true,
        create: true,
        update: true,
        delete: true,
        download: Some(true),
    };

    pub const NONE: Permission = Permission {
        view: false,
        create: false,
        update: false,
        delete: false,
        download: Some(false),
    };

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Update => self.update,
            Action::Delete => self.delete,
            Action::Download => self.download.unwrap_or(false),
        }
    }
}

/// The shipped grant table. Admin rows exist for completeness even though
/// `authorize` short-circuits admin before consulting them.
const DEFAULT_GRANTS: [(Role, Resource, Permission); 8] = [
    (Role::Admin, Resource::Users, Permission::FULL),
    (Role::Admin, Resource::Export, Permission::FULL),
    (Role::Admin, Resource::Config, Permission::FULL),
    (Role::Admin, Resource::Logs, Permission::FULL),
    (Role::User, Resource::Users, Permission::NONE),
    (
        Role::User,
        Resource::Export,
        Permission {
            view: true,
            create: false,
            update: false,
            delete: false,
            download: Some(true),
        },
    ),
    (Role::User, Resource::Config, Permission::NONE),
    (Role::User, Resource::Logs, Permission::NONE),
];

static DEFAULT_MATRIX: Lazy<CapabilityMatrix> =
    Lazy::new(|| CapabilityMatrix::from_grants(DEFAULT_GRANTS));

/// Immutable (role, resource) -> [`Permission`] table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityMatrix {
    grants: BTreeMap<Role, BTreeMap<Resource, Permission>>,
}

impl CapabilityMatrix {
    /// Build a matrix from grant rows. A later row for the same
    /// (role, resource) pair replaces an earlier one.
    pub fn from_grants<I>(grants: I) -> Self
    where
        I: IntoIterator<Item = (Role, Resource, Permission)>,
    {
        let mut table: BTreeMap<Role, BTreeMap<Resource, Permission>> = BTreeMap::new();
        for (role, resource, permission) in grants {
            table.entry(role).or_default().insert(resource, permission);
        }
        Self { grants: table }
    }

    pub fn permission(&self, role: Role, resource: Resource) -> Option<&Permission> {
        self.grants.get(&role)?.get(&resource)
    }

    /// Raw table lookup with no admin bypass. Missing rows read as `false`.
    pub fn lookup(&self, role: Role, resource: Resource, action: Action) -> bool {
        self.permission(role, resource)
            .is_some_and(|permission| permission.allows(action))
    }

    /// Whether `role` may perform `action` on `resource`.
    ///
    /// Admin is allowed unconditionally; every other role is answered from
    /// the table and fails closed on missing rows.
    pub fn authorize(&self, role: Role, resource: Resource, action: Action) -> bool {
        if role == Role::Admin {
            return true;
        }
        self.lookup(role, resource, action)
    }

    /// String-keyed form of [`CapabilityMatrix::authorize`].
    ///
    /// `"admin"` bypasses even unknown resources and actions. Any other
    /// unrecognised name resolves to `false`.
    pub fn authorize_named(&self, role: &str, resource: &str, action: &str) -> bool {
        if role == Role::Admin.as_str() {
            return true;
        }
        let (Ok(role), Ok(resource), Ok(action)) =
            (role.parse::<Role>(), resource.parse::<Resource>(), action.parse::<Action>())
        else {
            return false;
        };
        self.authorize(role, resource, action)
    }

    /// Every defined row, ordered by role then resource.
    pub fn rows(&self) -> impl Iterator<Item = (Role, Resource, &Permission)> {
        self.grants.iter().flat_map(|(role, resources)| {
            resources
                .iter()
                .map(move |(resource, permission)| (*role, *resource, permission))
        })
    }
}

/// The process-wide matrix, built on first use and never mutated.
pub fn default_matrix() -> &'static CapabilityMatrix {
    &DEFAULT_MATRIX
}

/// [`CapabilityMatrix::authorize`] against the default matrix.
pub fn authorize(role: Role, resource: Resource, action: Action) -> bool {
    default_matrix().authorize(role, resource, action)
}

/// [`CapabilityMatrix::authorize_named`] against the default matrix.
pub fn authorize_named(role: &str, resource: &str, action: &str) -> bool {
    default_matrix().authorize_named(role, resource, action)
}
