//! Role-based access policy.
//!
//! A single decision table for every collection, keyed by [`Role`]. All
//! functions here are pure: they read only their arguments, never touch
//! storage, and never fail. Missing or unrecognized input (no role, no uid)
//! always resolves to the most restrictive outcome.

use super::error::{SecurityError, SecurityResult};
use super::filter::VisibilityFilter;
use crate::model::{CollectionKind, Record, Role};

/// Evaluator for record visibility, creation, mutation, and ownership.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    /// Which records of `collection` the caller may see.
    ///
    /// Accounts are visible to administrators only. Business records are
    /// fully visible to staff; clients see the records they own.
    pub fn visibility_filter(
        role: Option<Role>,
        uid: Option<&str>,
        collection: CollectionKind,
    ) -> VisibilityFilter {
        match (collection, role) {
            (CollectionKind::Account, Some(Role::Admin)) => VisibilityFilter::AllowAll,
            (CollectionKind::Account, _) => VisibilityFilter::DenyAll,
            (_, Some(Role::Admin | Role::Broker)) => VisibilityFilter::AllowAll,
            (_, Some(Role::Client)) => match uid {
                Some(uid) => VisibilityFilter::OwnedBy(uid.to_string()),
                None => VisibilityFilter::DenyAll,
            },
            (_, None) => VisibilityFilter::DenyAll,
        }
    }

    /// Whether the caller may create records in `collection`.
    ///
    /// Provisioning accounts is reserved to administrators. Any known role
    /// may create business records; a client's records are attributed to
    /// the client by [`AccessPolicy::stamp_ownership`].
    pub fn can_create(role: Option<Role>, collection: CollectionKind) -> bool {
        match (collection, role) {
            (CollectionKind::Account, role) => role == Some(Role::Admin),
            (_, role) => role.is_some(),
        }
    }

    /// Whether the caller may update or delete `record`.
    ///
    /// An account record is never mutable by the login it describes, whatever
    /// that login's role.
    pub fn can_mutate_or_delete<R: Record>(role: Option<Role>, uid: Option<&str>, record: &R) -> bool {
        if R::KIND == CollectionKind::Account {
            let is_self = match (uid, record.account_uid()) {
                (Some(caller), Some(subject)) => caller == subject,
                _ => false,
            };
            return !is_self && role == Some(Role::Admin);
        }

        match role {
            Some(Role::Admin | Role::Broker) => true,
            Some(Role::Client) => match uid {
                Some(uid) => record.owner_client_id() == Some(uid),
                None => false,
            },
            None => false,
        }
    }

    /// Attribute a new record before it is persisted.
    ///
    /// Clients own what they create; staff-created records stay unowned. Any
    /// owner already on the incoming record is overwritten.
    pub fn stamp_ownership<R: Record>(role: Option<Role>, uid: Option<&str>, mut record: R) -> R {
        if !R::KIND.is_owner_scoped() {
            return record;
        }
        let owner = match (role, uid) {
            (Some(Role::Client), Some(uid)) => Some(uid.to_string()),
            _ => None,
        };
        record.set_owner_client_id(owner);
        record
    }

    /// Carry the stored owner over to an updated record.
    ///
    /// Ownership is fixed at creation; updates never re-attribute a record,
    /// regardless of who performs them or what the incoming record says.
    pub fn preserve_ownership<R: Record>(existing: &R, mut updated: R) -> R {
        if R::KIND.is_owner_scoped() {
            updated.set_owner_client_id(existing.owner_client_id().map(String::from));
        }
        updated
    }

    /// Require create permission or return an error.
    pub fn require_create(role: Option<Role>, collection: CollectionKind) -> SecurityResult<()> {
        if Self::can_create(role, collection) {
            Ok(())
        } else {
            Err(SecurityError::PermissionDenied(format!(
                "{} may not create {} records",
                describe_role(role),
                collection
            )))
        }
    }

    /// Require update/delete permission on `record` or return an error.
    pub fn require_mutate<R: Record>(role: Option<Role>, uid: Option<&str>, record: &R) -> SecurityResult<()> {
        if Self::can_mutate_or_delete(role, uid, record) {
            return Ok(());
        }
        if R::KIND == CollectionKind::Account && uid.is_some() && uid == record.account_uid() {
            return Err(SecurityError::SelfModification(record.id().to_string()));
        }
        Err(SecurityError::PermissionDenied(format!(
            "{} may not modify {} '{}'",
            describe_role(role),
            R::KIND,
            record.id()
        )))
    }
}

fn describe_role(role: Option<Role>) -> String {
    match role {
        Some(role) => role.to_string(),
        None => "caller without a role".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, Document, DocumentKind, Payment, Property, PropertyKind};
    use chrono::NaiveDate;

    const ROLES: [Option<Role>; 4] = [Some(Role::Admin), Some(Role::Broker), Some(Role::Client), None];

    fn property(owner: Option<&str>) -> Property {
        let mut p = Property::new("Itajubá", PropertyKind::Rental, 1800.0);
        p.id = "prop-1".into();
        p.owner_client_id = owner.map(String::from);
        p
    }

    fn payment(owner: Option<&str>) -> Payment {
        let mut p = Payment::new("prop-gone", 900.0, NaiveDate::from_ymd_opt(2026, 5, 5).unwrap());
        p.owner_client_id = owner.map(String::from);
        p
    }

    fn account(uid: &str, role: Role) -> Account {
        Account::new(uid, format!("{}@example.com", uid), role)
    }

    #[test]
    fn test_accounts_visible_to_admin_only() {
        let record = account("someone", Role::Client);
        for role in ROLES {
            let filter = AccessPolicy::visibility_filter(role, Some("u1"), CollectionKind::Account);
            assert_eq!(filter.matches(&record), role == Some(Role::Admin));
        }
    }

    #[test]
    fn test_client_sees_own_records() {
        for owner in [Some("u1"), Some("u2"), None] {
            let record = property(owner);
            let filter = AccessPolicy::visibility_filter(Some(Role::Client), Some("u1"), CollectionKind::Property);
            assert_eq!(filter.matches(&record), owner == Some("u1"));
        }
    }

    #[test]
    fn test_staff_see_everything() {
        for role in [Role::Admin, Role::Broker] {
            for uid in [Some("u1"), None] {
                for owner in [Some("u1"), Some("u9"), None] {
                    for kind in [CollectionKind::Property, CollectionKind::Payment, CollectionKind::Document] {
                        let filter = AccessPolicy::visibility_filter(Some(role), uid, kind);
                        assert!(filter.matches_owner(owner));
                    }
                }
            }
        }
    }

    #[test]
    fn test_client_without_uid_sees_nothing() {
        let filter = AccessPolicy::visibility_filter(Some(Role::Client), None, CollectionKind::Property);
        assert!(filter.is_deny_all());
        assert!(!filter.matches(&property(None)));
    }

    #[test]
    fn test_unknown_role_fails_closed() {
        let role = Role::parse("unknown-role");
        assert!(!AccessPolicy::can_create(role, CollectionKind::Account));
        assert!(!AccessPolicy::can_create(role, CollectionKind::Payment));
        let filter = AccessPolicy::visibility_filter(role, Some("u1"), CollectionKind::Payment);
        assert!(filter.is_deny_all());
        assert!(!AccessPolicy::can_mutate_or_delete(role, Some("u1"), &payment(Some("u1"))));
        let stamped = AccessPolicy::stamp_ownership(role, Some("u1"), property(Some("u1")));
        assert_eq!(stamped.owner_client_id, None);
    }

    #[test]
    fn test_can_create() {
        for role in Role::ALL {
            for kind in [CollectionKind::Property, CollectionKind::Payment, CollectionKind::Document] {
                assert!(AccessPolicy::can_create(Some(role), kind));
            }
        }
        assert!(AccessPolicy::can_create(Some(Role::Admin), CollectionKind::Account));
        assert!(!AccessPolicy::can_create(Some(Role::Broker), CollectionKind::Account));
        assert!(!AccessPolicy::can_create(Some(Role::Client), CollectionKind::Account));
    }

    #[test]
    fn test_mutation_rules() {
        let own = property(Some("u1"));
        let other = property(Some("u2"));
        let unowned = property(None);

        assert!(AccessPolicy::can_mutate_or_delete(Some(Role::Client), Some("u1"), &own));
        assert!(!AccessPolicy::can_mutate_or_delete(Some(Role::Client), Some("u1"), &other));
        assert!(!AccessPolicy::can_mutate_or_delete(Some(Role::Client), Some("u1"), &unowned));
        assert!(!AccessPolicy::can_mutate_or_delete(Some(Role::Client), None, &unowned));

        for role in [Role::Admin, Role::Broker] {
            assert!(AccessPolicy::can_mutate_or_delete(Some(role), Some("staff"), &other));
            assert!(AccessPolicy::can_mutate_or_delete(Some(role), Some("staff"), &unowned));
        }
    }

    #[test]
    fn test_account_mutation_admin_only() {
        let target = account("u7", Role::Client);
        assert!(AccessPolicy::can_mutate_or_delete(Some(Role::Admin), Some("root"), &target));
        assert!(!AccessPolicy::can_mutate_or_delete(Some(Role::Broker), Some("b1"), &target));
        assert!(!AccessPolicy::can_mutate_or_delete(Some(Role::Client), Some("c1"), &target));
    }

    #[test]
    fn test_no_self_delete() {
        for role in ROLES {
            let own = account("u1", role.unwrap_or(Role::Client));
            assert!(!AccessPolicy::can_mutate_or_delete(role, Some("u1"), &own));
        }
        let err = AccessPolicy::require_mutate(Some(Role::Admin), Some("u1"), &account("u1", Role::Admin));
        assert!(matches!(err, Err(SecurityError::SelfModification(_))));
    }

    #[test]
    fn test_stamp_ownership() {
        let stamped = AccessPolicy::stamp_ownership(Some(Role::Client), Some("u1"), property(None));
        assert_eq!(stamped.owner_client_id.as_deref(), Some("u1"));

        let forged = AccessPolicy::stamp_ownership(Some(Role::Broker), Some("b1"), property(Some("u3")));
        assert_eq!(forged.owner_client_id, None);

        let admin = AccessPolicy::stamp_ownership(Some(Role::Admin), Some("a1"), property(None));
        assert_eq!(admin.owner_client_id, None);
    }

    #[test]
    fn test_stamp_is_idempotent() {
        for role in ROLES {
            let once = AccessPolicy::stamp_ownership(role, Some("u1"), property(None));
            let twice = AccessPolicy::stamp_ownership(role, Some("u1"), once.clone());
            assert_eq!(once.owner_client_id, twice.owner_client_id);
        }
    }

    #[test]
    fn test_stamp_leaves_accounts_alone() {
        let acc = account("u1", Role::Client);
        let stamped = AccessPolicy::stamp_ownership(Some(Role::Client), Some("u1"), acc.clone());
        assert_eq!(stamped, acc);
    }

    #[test]
    fn test_preserve_ownership() {
        let stored = property(Some("u1"));
        let incoming = property(Some("u2"));
        assert_eq!(
            AccessPolicy::preserve_ownership(&stored, incoming).owner_client_id.as_deref(),
            Some("u1")
        );

        let mut doc = Document::new("prop-1", DocumentKind::Deed, "deed.pdf");
        doc.owner_client_id = None;
        let mut edit = doc.clone();
        edit.owner_client_id = Some("u5".into());
        assert_eq!(AccessPolicy::preserve_ownership(&doc, edit).owner_client_id, None);
    }

    #[test]
    fn test_dangling_payment_still_visible() {
        let filter = AccessPolicy::visibility_filter(Some(Role::Client), Some("u1"), CollectionKind::Payment);
        assert!(filter.matches(&payment(Some("u1"))));
    }

    #[test]
    fn test_require_create_message() {
        let err = AccessPolicy::require_create(None, CollectionKind::Account).unwrap_err();
        assert!(err.to_string().contains("without a role"));
        assert!(AccessPolicy::require_create(Some(Role::Client), CollectionKind::Document).is_ok());
    }
}
