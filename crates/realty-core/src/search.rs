//! Search criteria applied on top of visibility.
//!
//! Searches only ever narrow the caller's visible set; the repository
//! applies the visibility filter first.

use crate::model::{Document, DocumentKind, Payment, PaymentStatus, Property, PropertyKind, PropertyStatus, Record};

/// Criteria a record must satisfy to be returned by a search.
pub trait RecordSearch<R: Record> {
    /// Whether the record satisfies every criterion.
    fn matches(&self, record: &R) -> bool;
}

/// Property search: location, kind, and price band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySearch {
    /// Case-insensitive substring of the city.
    pub city: Option<String>,
    pub kind: Option<PropertyKind>,
    pub status: Option<PropertyStatus>,
    /// Inclusive lower price bound.
    pub min_price: Option<f64>,
    /// Inclusive upper price bound.
    pub max_price: Option<f64>,
}

impl PropertySearch {
    /// Match everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to cities containing `city`.
    pub fn city(mut self, city: impl Into<String>) -> Self {
        let city = city.into();
        self.city = if city.trim().is_empty() { None } else { Some(city) };
        self
    }

    /// Restrict to a kind.
    pub fn kind(mut self, kind: PropertyKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict to a status.
    pub fn status(mut self, status: PropertyStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a price band. Either bound may be open.
    pub fn price_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }
}

impl RecordSearch<Property> for PropertySearch {
    fn matches(&self, record: &Property) -> bool {
        if let Some(city) = &self.city {
            let needle = city.trim().to_lowercase();
            if !record.city.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if self.kind.is_some_and(|k| k != record.kind) {
            return false;
        }
        if self.status.is_some_and(|s| s != record.status) {
            return false;
        }
        if self.min_price.is_some_and(|min| record.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| record.price > max) {
            return false;
        }
        true
    }
}

/// Payment search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentSearch {
    pub status: Option<PaymentStatus>,
    pub property_id: Option<String>,
}

impl RecordSearch<Payment> for PaymentSearch {
    fn matches(&self, record: &Payment) -> bool {
        self.status.map_or(true, |s| s == record.status)
            && self
                .property_id
                .as_deref()
                .map_or(true, |id| id == record.property_id)
    }
}

/// Document search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSearch {
    pub kind: Option<DocumentKind>,
    pub property_id: Option<String>,
}

impl RecordSearch<Document> for DocumentSearch {
    fn matches(&self, record: &Document) -> bool {
        self.kind.map_or(true, |k| k == record.kind)
            && self
                .property_id
                .as_deref()
                .map_or(true, |id| id == record.property_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing(city: &str, kind: PropertyKind, price: f64) -> Property {
        Property::new(city, kind, price)
    }

    #[test]
    fn test_city_substring_case_insensitive() {
        let search = PropertySearch::new().city("itaj");
        assert!(search.matches(&listing("Itajubá", PropertyKind::Sale, 1.0)));
        assert!(!search.matches(&listing("Pouso Alegre", PropertyKind::Sale, 1.0)));
    }

    #[test]
    fn test_blank_city_ignored() {
        let search = PropertySearch::new().city("  ");
        assert!(search.city.is_none());
        assert!(search.matches(&listing("Anywhere", PropertyKind::Rental, 1.0)));
    }

    #[test]
    fn test_price_bounds_inclusive() {
        let search = PropertySearch::new().price_between(Some(1000.0), Some(2000.0));
        assert!(search.matches(&listing("A", PropertyKind::Rental, 1000.0)));
        assert!(search.matches(&listing("A", PropertyKind::Rental, 2000.0)));
        assert!(!search.matches(&listing("A", PropertyKind::Rental, 2000.01)));
        assert!(!search.matches(&listing("A", PropertyKind::Rental, 999.0)));
    }

    #[test]
    fn test_kind_filter() {
        let search = PropertySearch::new().kind(PropertyKind::Rental);
        assert!(!search.matches(&listing("A", PropertyKind::Sale, 1.0)));
    }

    #[test]
    fn test_payment_search() {
        let due = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let payment = Payment::new("p1", 10.0, due).with_status(PaymentStatus::Late);
        assert!(PaymentSearch::default().matches(&payment));
        let late = PaymentSearch {
            status: Some(PaymentStatus::Late),
            property_id: Some("p1".into()),
        };
        assert!(late.matches(&payment));
        let other = PaymentSearch {
            property_id: Some("p2".into()),
            ..Default::default()
        };
        assert!(!other.matches(&payment));
    }
}
