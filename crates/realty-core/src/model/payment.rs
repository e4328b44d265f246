//! Payments.

use super::{CollectionKind, Record};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// Settlement state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    #[serde(alias = "pendente")]
    Pending,
    #[serde(alias = "pago")]
    Paid,
    #[serde(alias = "atrasado")]
    Late,
}

impl PaymentStatus {
    /// Parse a status name, accepting the legacy Portuguese values.
    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "pendente" => Some(PaymentStatus::Pending),
            "paid" | "pago" => Some(PaymentStatus::Paid),
            "late" | "atrasado" => Some(PaymentStatus::Late),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => f.write_str("pending"),
            PaymentStatus::Paid => f.write_str("paid"),
            PaymentStatus::Late => f.write_str("late"),
        }
    }
}

/// A payment due on a property.
///
/// `property_id` may point at a property that no longer exists; readers
/// must treat that as a missing join, not as corruption.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub id: String,
    pub property_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_client_id: Option<String>,
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Create a pending payment.
    pub fn new(property_id: impl Into<String>, amount: f64, due_date: NaiveDate) -> Self {
        Self {
            id: String::new(),
            property_id: property_id.into(),
            owner_client_id: None,
            amount,
            due_date,
            paid_date: None,
            status: PaymentStatus::Pending,
            description: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as paid on the given date.
    pub fn paid_on(mut self, date: NaiveDate) -> Self {
        self.paid_date = Some(date);
        self.status = PaymentStatus::Paid;
        self
    }

    /// Whether money is still owed.
    pub fn is_outstanding(&self) -> bool {
        self.status != PaymentStatus::Paid
    }
}

impl Record for Payment {
    const KIND: CollectionKind = CollectionKind::Payment;

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
    fn test_paid_on() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let paid = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let payment = Payment::new("p-1", 1200.0, due).paid_on(paid);
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.paid_date, Some(paid));
        assert!(!payment.is_outstanding());
    }

    #[test]
    fn test_legacy_status() {
        assert_eq!(PaymentStatus::parse("atrasado"), Some(PaymentStatus::Late));
        let status: PaymentStatus = serde_json::from_str("\"pago\"").unwrap();
        assert_eq!(status, PaymentStatus::Paid);
    }
}
