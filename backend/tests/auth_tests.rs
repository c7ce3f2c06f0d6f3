//! Authentication and authorization tests
//!
//! - Role permission enforcement for admin, manager, kasir and chef
//! - Username and password rules for staff accounts
//! - Password hashing

use proptest::prelude::*;
use shared::{role_permissions, validate_password, validate_username, Action, Resource, UserRole};
use std::str::FromStr;

fn has(role: UserRole, resource: Resource, action: Action) -> bool {
    role_permissions(role)
        .iter()
        .any(|p| p.resource == resource && p.actions.contains(&action))
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate valid usernames (3-32 lowercase alphanumeric)
fn username_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_.]{3,32}"
}

/// Generate valid passwords (8+ chars)
fn password_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9!@#$%]{8,20}"
}

fn role_strategy() -> impl Strategy<Value = UserRole> {
    prop_oneof![
        Just(UserRole::Admin),
        Just(UserRole::Manager),
        Just(UserRole::Kasir),
        Just(UserRole::Chef),
    ]
}

proptest! {
    #[test]
    fn test_valid_usernames_accepted(username in username_strategy()) {
        prop_assert!(validate_username(&username).is_ok());
    }

    #[test]
    fn test_valid_passwords_accepted(password in password_strategy()) {
        prop_assert!(validate_password(&password).is_ok());
    }

    /// Permission strings are `resource:action` and admin holds every one
    #[test]
    fn test_admin_covers_every_role(role in role_strategy()) {
        let admin = UserRole::Admin.permission_strings();
        for permission in role.permission_strings() {
            prop_assert_eq!(permission.split(':').count(), 2);
            prop_assert!(admin.contains(&permission));
        }
    }

    #[test]
    fn test_role_round_trips(role in role_strategy()) {
        prop_assert_eq!(UserRole::from_str(role.as_str()), Ok(role));
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod role_permission_tests {
    use super::*;

    #[test]
    fn test_kasir_sells_but_does_not_cook() {
        assert!(has(UserRole::Kasir, Resource::Transaksi, Action::Create));
        assert!(has(UserRole::Kasir, Resource::Barang, Action::View));
        assert!(!has(UserRole::Kasir, Resource::BahanBaku, Action::Create));
        assert!(!has(UserRole::Kasir, Resource::Produksi, Action::Approve));
        assert!(!has(UserRole::Kasir, Resource::Modal, Action::View));
    }

    #[test]
    fn test_chef_claims_and_resolves_production() {
        assert!(has(UserRole::Chef, Resource::BahanBaku, Action::Edit));
        assert!(has(UserRole::Chef, Resource::Produksi, Action::Create));
        assert!(has(UserRole::Chef, Resource::Produksi, Action::Approve));
        assert!(!has(UserRole::Chef, Resource::Transaksi, Action::Create));
        assert!(!has(UserRole::Chef, Resource::Modal, Action::Edit));
    }

    #[test]
    fn test_manager_approves_production() {
        assert!(has(UserRole::Manager, Resource::Produksi, Action::Approve));
        assert!(has(UserRole::Manager, Resource::Laporan, Action::Export));
        assert!(!has(UserRole::Manager, Resource::Transaksi, Action::Delete));
        assert!(!has(UserRole::Manager, Resource::Settings, Action::Edit));
    }

    #[test]
    fn test_only_admin_manages_users() {
        assert!(has(UserRole::Admin, Resource::User, Action::Create));
        for role in [UserRole::Manager, UserRole::Kasir, UserRole::Chef] {
            assert!(!has(role, Resource::User, Action::Create));
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(UserRole::from_str("owner").is_err());
    }
}

#[cfg(test)]
mod credential_tests {
    use super::*;

    #[test]
    fn test_invalid_usernames() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Kasir1").is_err());
        assert!(validate_username("kasir satu").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_short_password() {
        assert!(validate_password("1234567").is_err());
    }

    #[test]
    fn test_password_hash_not_stored_plain() {
        let password = "rahasia123";
        let hash = bcrypt::hash(password, 4).unwrap();

        assert_ne!(hash, password);
        assert!(bcrypt::verify(password, &hash).unwrap());
        assert!(!bcrypt::verify("salah", &hash).unwrap());
    }
}
