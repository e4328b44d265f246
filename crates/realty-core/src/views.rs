//! Records joined with the property they reference.

use crate::model::{Document, Payment, Property};

/// Records that point at a property.
pub trait PropertyLinked {
    /// Referenced property id. The property may no longer exist.
    fn property_id(&self) -> &str;
}

impl PropertyLinked for Payment {
    fn property_id(&self) -> &str {
        &self.property_id
    }
}

impl PropertyLinked for Document {
    fn property_id(&self) -> &str {
        &self.property_id
    }
}

/// A record together with its property, when that property is available.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WithProperty<R> {
    #[serde(flatten)]
    pub record: R,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<Property>,
}

impl<R> WithProperty<R> {
    /// Short label of the referenced property for listings.
    pub fn property_label(&self) -> String {
        match &self.property {
            Some(p) if !p.address.is_empty() => format!("{}, {}", p.address, p.city),
            Some(p) => p.city.clone(),
            None => "(property unavailable)".to_string(),
        }
    }
}
