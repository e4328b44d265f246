//! Login accounts.

use super::{CollectionKind, Record, Role};
use chrono::{DateTime, Utc};

/// The authorization record of a login.
///
/// Keyed by the uid issued by the identity provider; one account per uid.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub display_name: String,
    /// CPF or CNPJ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create an account record.
    pub fn new(uid: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            role,
            display_name: String::new(),
            tax_id: None,
            phone: None,
            created_at: Utc::now(),
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set the CPF/CNPJ.
    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    /// Set the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

impl Record for Account {
    const KIND: CollectionKind = CollectionKind::Account;

    fn id(&self) -> &str {
        &self.uid
    }

    fn set_id(&mut self, id: String) {
        self.uid = id;
    }

    fn account_uid(&self) -> Option<&str> {
        Some(&self.uid)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }
}
