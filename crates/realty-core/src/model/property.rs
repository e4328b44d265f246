//! Property listings.

use super::{CollectionKind, Record};
use chrono::{DateTime, Utc};
use std::fmt;

/// Whether a property is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Offered for sale.
    #[default]
    #[serde(alias = "venda")]
    Sale,
    /// Offered for rent.
    #[serde(alias = "aluguel")]
    Rental,
}

impl PropertyKind {
    /// Parse a kind name, accepting the legacy Portuguese values.
    pub fn parse(s: &str) -> Option<PropertyKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sale" | "venda" => Some(PropertyKind::Sale),
            "rental" | "rent" | "aluguel" => Some(PropertyKind::Rental),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Sale => f.write_str("sale"),
            PropertyKind::Rental => f.write_str("rental"),
        }
    }
}

/// Listing availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    /// Open for sale or rent.
    #[default]
    #[serde(alias = "disponivel")]
    Available,
    /// Withdrawn, sold, or rented out.
    #[serde(alias = "indisponivel")]
    Unavailable,
}

impl PropertyStatus {
    /// Parse a status name.
    pub fn parse(s: &str) -> Option<PropertyStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" | "disponivel" => Some(PropertyStatus::Available),
            "unavailable" | "indisponivel" => Some(PropertyStatus::Unavailable),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyStatus::Available => f.write_str("available"),
            PropertyStatus::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// A property listing.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Property {
    /// Record id; assigned on creation.
    #[serde(default)]
    pub id: String,
    /// Client the listing belongs to. Absent for business-owned listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_client_id: Option<String>,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// City.
    pub city: String,
    /// Sale or rental.
    #[serde(default)]
    pub kind: PropertyKind,
    /// Asking price (sale) or monthly rent.
    pub price: f64,
    /// Availability.
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    /// Floor area in square metres.
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Property {
    /// Create a listing in the given city.
    pub fn new(city: impl Into<String>, kind: PropertyKind, price: f64) -> Self {
        Self {
            city: city.into(),
            kind,
            price,
            ..Default::default()
        }
    }

    /// Set the street address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: PropertyStatus) -> Self {
        self.status = status;
        self
    }

    /// Set bedroom and bathroom counts.
    pub fn with_rooms(mut self, bedrooms: u32, bathrooms: u32) -> Self {
        self.bedrooms = bedrooms;
        self.bathrooms = bathrooms;
        self
    }

    /// Set the floor area.
    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the listing is open.
    pub fn is_available(&self) -> bool {
        self.status == PropertyStatus::Available
    }
}

impl Record for Property {
    const KIND: CollectionKind = CollectionKind::Property;

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
