//! Record model.
//!
//! Four collections make up the back office: properties, payments,
//! documents, and accounts. The first three are business records that may
//! be owned by a client; accounts describe logins and are managed by
//! administrators only.

pub mod account;
pub mod document;
pub mod payment;
pub mod property;
pub mod role;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

pub use account::Account;
pub use document::{Document, DocumentKind};
pub use payment::{Payment, PaymentStatus};
pub use property::{Property, PropertyKind, PropertyStatus};
pub use role::Role;

/// The collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Property listings.
    Property,
    /// Payments tied to a property.
    Payment,
    /// Documents tied to a property.
    Document,
    /// Login accounts.
    Account,
}

impl CollectionKind {
    /// All collections.
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Property,
        CollectionKind::Payment,
        CollectionKind::Document,
        CollectionKind::Account,
    ];

    /// Parse a collection name (singular or plural).
    pub fn parse(s: &str) -> Option<CollectionKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "property" | "properties" => Some(CollectionKind::Property),
            "payment" | "payments" => Some(CollectionKind::Payment),
            "document" | "documents" => Some(CollectionKind::Document),
            "account" | "accounts" => Some(CollectionKind::Account),
            _ => None,
        }
    }

    /// Singular name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Property => "property",
            CollectionKind::Payment => "payment",
            CollectionKind::Document => "document",
            CollectionKind::Account => "account",
        }
    }

    /// Name of the storage tree holding this collection.
    pub fn tree_name(&self) -> &'static str {
        match self {
            CollectionKind::Property => "properties",
            CollectionKind::Payment => "payments",
            CollectionKind::Document => "documents",
            CollectionKind::Account => "accounts",
        }
    }

    /// Whether records of this collection carry an owning client.
    pub fn is_owner_scoped(&self) -> bool {
        !matches!(self, CollectionKind::Account)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted record of one of the four collections.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Collection this record type lives in.
    const KIND: CollectionKind;

    /// Storage key of the record.
    fn id(&self) -> &str;

    /// Replace the storage key.
    fn set_id(&mut self, id: String);

    /// Owning client, for owner-scoped collections.
    fn owner_client_id(&self) -> Option<&str> {
        None
    }

    /// Set or clear the owning client. No-op for collections without owners.
    fn set_owner_client_id(&mut self, _owner: Option<String>) {}

    /// The login this record describes, for account records.
    fn account_uid(&self) -> Option<&str> {
        None
    }

    /// The property this record is filed under, for payments and documents.
    fn linked_property_id(&self) -> Option<&str> {
        None
    }

    /// Creation time, if recorded.
    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Set the creation time.
    fn set_created_at(&mut self, at: DateTime<Utc>);

    /// Set the last-update time.
    fn set_updated_at(&mut self, _at: DateTime<Utc>) {}
}
