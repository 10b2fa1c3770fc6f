//! Permission gate
//!
//! Forms declare the permissions they need as ordered `action:resource`
//! specs; the gate is a pure AND over that list. The checker is a seam so
//! the surrounding application can plug in its own authorization source;
//! [`RolePermissions`] is the default role-table checker for the clinic
//! staff roles.

use once_cell::sync::Lazy;
use shared::{FormError, Role, User};
use std::collections::HashMap;

/// One required capability, parsed from an `action:resource` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub action: String,
    pub resource: String,
}

impl Permission {
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
        }
    }

    pub fn parse(spec: &str) -> Result<Self, FormError> {
        match spec.split_once(':') {
            Some((action, resource)) if !action.is_empty() && !resource.is_empty() => {
                Ok(Self::new(action, resource))
            }
            _ => Err(FormError::InvalidPermissionSpec(spec.to_string())),
        }
    }

    pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> Result<Vec<Self>, FormError> {
        specs.iter().map(|s| Self::parse(s.as_ref())).collect()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.action, self.resource)
    }
}

/// Authorization seam consulted by the form gate, both at mount and again at
/// submit time.
pub trait PermissionChecker: Send + Sync {
    fn validate(&self, user: Option<&User>, action: &str, resource: &str) -> bool;
}

/// (action, resource) grants per role. Admin is handled separately and is
/// allowed everything.
static ROLE_GRANTS: Lazy<HashMap<Role, Vec<(&'static str, &'static str)>>> = Lazy::new(|| {
    let mut grants = HashMap::new();
    grants.insert(
        Role::Doctor,
        vec![
            ("read", "patients"),
            ("create", "patients"),
            ("update", "patients"),
            ("read", "treatments"),
            ("create", "treatments"),
            ("update", "treatments"),
            ("read", "exams"),
            ("create", "exams"),
            ("update", "exams"),
        ],
    );
    grants.insert(
        Role::Secretary,
        vec![
            ("read", "patients"),
            ("create", "patients"),
            ("read", "appointments"),
            ("create", "appointments"),
            ("read", "products"),
        ],
    );
    grants.insert(Role::Guest, vec![]);
    grants
});

/// Default checker backed by the static role-grant table.
#[derive(Debug, Default, Clone, Copy)]
pub struct RolePermissions;

impl PermissionChecker for RolePermissions {
    fn validate(&self, user: Option<&User>, action: &str, resource: &str) -> bool {
        let user = match user {
            Some(user) => user,
            None => return false,
        };
        if user.role == Role::Admin {
            return true;
        }
        ROLE_GRANTS
            .get(&user.role)
            .map(|grants| grants.iter().any(|(a, r)| *a == action && *r == resource))
            .unwrap_or(false)
    }
}
