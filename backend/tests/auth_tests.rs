//! Authentication and authorization tests
//!
//! Covers the role permission model and session expiry arithmetic.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use shared::models::Role;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("manager"), Some(Role::Manager));
        assert_eq!(Role::parse("employee"), Some(Role::Employee));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse("Admin"), None);
    }

    /// Admin-only operations stay admin-only
    #[test]
    fn test_admin_only_operations() {
        let admin_only = [Role::Admin];
        assert!(Role::Admin.is_allowed(&admin_only));
        assert!(!Role::Manager.is_allowed(&admin_only));
        assert!(!Role::Employee.is_allowed(&admin_only));
    }

    /// Admin passes checks that name lesser roles
    #[test]
    fn test_admin_supersedes() {
        assert!(Role::Admin.is_allowed(&[Role::Manager]));
        assert!(Role::Admin.is_allowed(&[Role::Employee]));
        assert!(Role::Admin.is_allowed(&[Role::Manager, Role::Employee]));
    }

    /// Manager and employee only pass checks naming them
    #[test]
    fn test_non_admin_membership() {
        assert!(Role::Manager.is_allowed(&[Role::Admin, Role::Manager]));
        assert!(!Role::Manager.is_allowed(&[Role::Admin]));
        assert!(Role::Employee.is_allowed(&[Role::Employee]));
        assert!(!Role::Employee.is_allowed(&[Role::Admin, Role::Manager]));
    }

    /// Sessions expire after the configured window (8 hours by default)
    #[test]
    fn test_session_expiry_window() {
        let now = Utc::now();
        let expires_at = now + Duration::hours(8);

        assert!(expires_at > now);
        assert!(expires_at > now + Duration::hours(7));
        assert!(expires_at <= now + Duration::hours(8));

        // An expired session compares in the past
        let expired = now - Duration::seconds(1);
        assert!(expired <= now);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::Admin),
            Just(Role::Manager),
            Just(Role::Employee),
        ]
    }

    proptest! {
        /// A role always passes a check naming it
        #[test]
        fn prop_role_passes_own_check(role in role_strategy()) {
            prop_assert!(role.is_allowed(&[role]));
        }

        /// Admin passes every possible check
        #[test]
        fn prop_admin_passes_everything(
            allowed in prop::collection::vec(role_strategy(), 0..3)
        ) {
            prop_assert!(Role::Admin.is_allowed(&allowed));
        }

        /// Non-admins never pass a check that does not name them
        #[test]
        fn prop_non_admin_needs_membership(
            role in prop_oneof![Just(Role::Manager), Just(Role::Employee)],
            allowed in prop::collection::vec(role_strategy(), 0..3)
        ) {
            let expected = allowed.contains(&role);
            prop_assert_eq!(role.is_allowed(&allowed), expected);
        }

        /// Expiry windows are strictly ordered by duration
        #[test]
        fn prop_expiry_ordering(hours_a in 1i64..48, hours_b in 1i64..48) {
            let now = Utc::now();
            let a = now + Duration::hours(hours_a);
            let b = now + Duration::hours(hours_b);
            prop_assert_eq!(a < b, hours_a < hours_b);
        }
    }
}
