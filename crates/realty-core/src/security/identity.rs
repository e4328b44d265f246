//! Caller identity passed into every policy and repository call.

use crate::model::Role;
use std::fmt;

/// The `(uid, role)` pair supplied by the identity provider.
///
/// Either half may be missing: an unauthenticated caller has no uid, and a
/// caller whose role is unknown (or who has not finished registration) has
/// no role. Policy decisions treat a missing half as a denial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    uid: Option<String>,
    role: Option<Role>,
}

impl Identity {
    /// Create an identity with a known role.
    pub fn new(uid: impl Into<String>, role: Role) -> Self {
        Self {
            uid: normalize_uid(uid.into()),
            role: Some(role),
        }
    }

    /// Build an identity from untrusted claim strings.
    ///
    /// Blank uids and unrecognized role strings are dropped rather than
    /// rejected, so a malformed claim can only ever reduce access.
    pub fn from_claims(uid: Option<&str>, role: Option<&str>) -> Self {
        Self {
            uid: uid.and_then(|u| normalize_uid(u.to_string())),
            role: role.and_then(Role::parse),
        }
    }

    /// An authenticated login without an account record yet.
    pub fn unregistered(uid: impl Into<String>) -> Self {
        Self {
            uid: normalize_uid(uid.into()),
            role: None,
        }
    }

    /// No identity at all.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The caller's uid.
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// The caller's role.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Whether the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    /// Whether the caller is an administrator or broker.
    pub fn is_staff(&self) -> bool {
        self.role.is_some_and(|r| r.is_staff())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let uid = self.uid.as_deref().unwrap_or("-");
        match self.role {
            Some(role) => write!(f, "{}({})", uid, role),
            None => write!(f, "{}(no role)", uid),
        }
    }
}

fn normalize_uid(uid: String) -> Option<String> {
    let trimmed = uid.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == uid.len() {
        Some(uid)
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_claims_fails_closed() {
        let id = Identity::from_claims(Some("u-1"), Some("unknown-role"));
        assert_eq!(id.uid(), Some("u-1"));
        assert_eq!(id.role(), None);

        let id = Identity::from_claims(Some("   "), Some("corretor"));
        assert_eq!(id.uid(), None);
        assert_eq!(id.role(), Some(Role::Broker));
    }

    #[test]
    fn test_role_helpers() {
        assert!(Identity::new("a", Role::Admin).is_admin());
        assert!(Identity::new("b", Role::Broker).is_staff());
        assert!(!Identity::new("c", Role::Client).is_staff());
        assert!(!Identity::anonymous().is_staff());
    }

    #[test]
    fn test_display() {
        assert_eq!(Identity::new("u-1", Role::Client).to_string(), "u-1(client)");
        assert_eq!(Identity::unregistered("u-2").to_string(), "u-2(no role)");
    }
}
