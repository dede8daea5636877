//! User and session models

use serde::{Deserialize, Serialize};

/// User roles, ordered informally admin > manager > employee
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }

    /// Whether this role satisfies a check naming `allowed` roles.
    /// Admin passes every check.
    pub fn is_allowed(&self, allowed: &[Role]) -> bool {
        *self == Role::Admin || allowed.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_every_check() {
        assert!(Role::Admin.is_allowed(&[Role::Employee]));
        assert!(Role::Admin.is_allowed(&[Role::Manager]));
        assert!(Role::Admin.is_allowed(&[]));
    }

    #[test]
    fn membership_checks() {
        assert!(Role::Manager.is_allowed(&[Role::Manager, Role::Employee]));
        assert!(!Role::Employee.is_allowed(&[Role::Manager]));
        assert!(!Role::Manager.is_allowed(&[Role::Admin]));
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("root"), None);
    }
}
