//! Documents attached to properties.

use super::{CollectionKind, Record};
use chrono::{DateTime, Utc};
use std::fmt;

/// Kind of document on file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    #[serde(alias = "contrato")]
    Contract,
    #[serde(alias = "escritura")]
    Deed,
    /// Taxpayer registration (CPF/CNPJ).
    #[serde(alias = "cpf")]
    TaxId,
    /// Identity card (RG).
    #[serde(alias = "rg")]
    IdCard,
    #[serde(alias = "comprovante")]
    Receipt,
    #[default]
    #[serde(alias = "outro")]
    Other,
}

impl DocumentKind {
    /// Parse a kind name, accepting the legacy Portuguese values.
    pub fn parse(s: &str) -> Option<DocumentKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contract" | "contrato" => Some(DocumentKind::Contract),
            "deed" | "escritura" => Some(DocumentKind::Deed),
            "tax-id" | "cpf" => Some(DocumentKind::TaxId),
            "id-card" | "rg" => Some(DocumentKind::IdCard),
            "receipt" | "comprovante" => Some(DocumentKind::Receipt),
            "other" | "outro" => Some(DocumentKind::Other),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Contract => "contract",
            DocumentKind::Deed => "deed",
            DocumentKind::TaxId => "tax-id",
            DocumentKind::IdCard => "id-card",
            DocumentKind::Receipt => "receipt",
            DocumentKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// A document filed against a property.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,
    pub property_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_client_id: Option<String>,
    #[serde(default)]
    pub kind: DocumentKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Where the file itself is hosted.
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a document record.
    pub fn new(property_id: impl Into<String>, kind: DocumentKind, name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            property_id: property_id.into(),
            owner_client_id: None,
            kind,
            name: name.into(),
            description: String::new(),
            url: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the hosted file location.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Record for Document {
    const KIND: CollectionKind = CollectionKind::Document;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_client_id(&self) -> Option<&str> {
        self.owner_client_id.as_deref()
    }

    fn set_owner_client_id(&mut self, owner: Option<String>) {
        self.owner_client_id = owner;
    }

    fn linked_property_id(&self) -> Option<&str> {
        Some(&self.property_id)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = Some(at);
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DocumentKind::parse("rg"), Some(DocumentKind::IdCard));
        assert_eq!(DocumentKind::TaxId.to_string(), "tax-id");
        let kind: DocumentKind = serde_json::from_str("\"escritura\"").unwrap();
        assert_eq!(kind, DocumentKind::Deed);
        assert_eq!(serde_json::to_string(&DocumentKind::IdCard).unwrap(), "\"id-card\"");
    }
}
