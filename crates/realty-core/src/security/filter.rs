//! Row visibility predicates.

use crate::model::Record;
use std::fmt;

/// Which records of a collection a caller may see.
///
/// A filter is a plain value: it carries no references to storage or
/// session state, so the same filter can be evaluated in-process or shipped
/// to whatever layer runs the query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "owner", rename_all = "snake_case")]
pub enum VisibilityFilter {
    /// Every record is visible.
    AllowAll,
    /// No record is visible.
    DenyAll,
    /// Only records owned by this client are visible.
    OwnedBy(String),
}

impl VisibilityFilter {
    /// Evaluate the filter against a record.
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.matches_owner(record.owner_client_id())
    }

    /// Evaluate the filter against a record's owner field.
    pub fn matches_owner(&self, owner: Option<&str>) -> bool {
        match self {
            VisibilityFilter::AllowAll => true,
            VisibilityFilter::DenyAll => false,
            VisibilityFilter::OwnedBy(uid) => owner == Some(uid.as_str()),
        }
    }

    /// Keep only the visible records.
    pub fn apply<R: Record>(&self, records: impl IntoIterator<Item = R>) -> Vec<R> {
        match self {
            VisibilityFilter::DenyAll => Vec::new(),
            _ => records.into_iter().filter(|r| self.matches(r)).collect(),
        }
    }

    /// Whether the filter admits nothing.
    pub fn is_deny_all(&self) -> bool {
        matches!(self, VisibilityFilter::DenyAll)
    }
}

impl fmt::Display for VisibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityFilter::AllowAll => f.write_str("all"),
            VisibilityFilter::DenyAll => f.write_str("none"),
            VisibilityFilter::OwnedBy(uid) => write!(f, "owner_client_id = {}", uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Property, PropertyKind};

    fn owned(owner: Option<&str>) -> Property {
        let mut p = Property::new("Itajubá", PropertyKind::Sale, 100.0);
        p.owner_client_id = owner.map(String::from);
        p
    }

    #[test]
    fn test_owned_by() {
        let filter = VisibilityFilter::OwnedBy("u1".into());
        assert!(filter.matches(&owned(Some("u1"))));
        assert!(!filter.matches(&owned(Some("u2"))));
        assert!(!filter.matches(&owned(None)));
    }

    #[test]
    fn test_apply() {
        let records = vec![owned(Some("u1")), owned(None), owned(Some("u2"))];
        assert_eq!(VisibilityFilter::AllowAll.apply(records.clone()).len(), 3);
        assert!(VisibilityFilter::DenyAll.apply(records.clone()).is_empty());
        assert_eq!(VisibilityFilter::OwnedBy("u2".into()).apply(records).len(), 1);
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_string(&VisibilityFilter::OwnedBy("u1".into())).unwrap();
        assert_eq!(json, r#"{"type":"owned_by","owner":"u1"}"#);
        let back: VisibilityFilter = serde_json::from_str(r#"{"type":"deny_all"}"#).unwrap();
        assert!(back.is_deny_all());
    }
}
