//! Overview counters for the caller's visible records.

use crate::model::{Account, Document, Payment, PaymentStatus, Property, PropertyKind};
use crate::repository::Repository;
use crate::security::{Identity, SecurityResult};

/// Summary of what the caller can see.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct DashboardStats {
    pub total_properties: usize,
    pub properties_for_sale: usize,
    pub properties_for_rent: usize,
    pub total_payments: usize,
    pub pending_payments: usize,
    pub late_payments: usize,
    /// Sum of amounts not yet paid.
    pub outstanding_amount: f64,
    pub total_documents: usize,
    /// Zero unless the caller may see accounts.
    pub total_accounts: usize,
}

impl DashboardStats {
    /// Compute the counters through the repository, so every figure respects
    /// the caller's visibility.
    pub fn collect(repo: &Repository, identity: &Identity) -> SecurityResult<Self> {
        let properties = repo.list::<Property>(identity)?;
        let payments = repo.list::<Payment>(identity)?;
        let documents = repo.list::<Document>(identity)?;
        let accounts = repo.list::<Account>(identity)?;

        let mut stats = DashboardStats {
            total_properties: properties.len(),
            total_payments: payments.len(),
            total_documents: documents.len(),
            total_accounts: accounts.len(),
            ..Default::default()
        };

        for property in &properties {
            match property.kind {
                PropertyKind::Sale => stats.properties_for_sale += 1,
                PropertyKind::Rental => stats.properties_for_rent += 1,
            }
        }

        for payment in &payments {
            match payment.status {
                PaymentStatus::Pending => stats.pending_payments += 1,
                PaymentStatus::Late => stats.late_payments += 1,
                PaymentStatus::Paid => {}
            }
            if payment.is_outstanding() {
                stats.outstanding_amount += payment.amount;
            }
        }

        Ok(stats)
    }
}
