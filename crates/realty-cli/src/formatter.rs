//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::Table;
use realty_core::{Account, DashboardStats, Document, Payment, Property, WithProperty};
use serde::Serialize;

use crate::commands::PolicyReport;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    fn format_properties(&self, properties: &[Property]) -> String;

    fn format_payments(&self, payments: &[WithProperty<Payment>]) -> String;

    fn format_documents(&self, documents: &[WithProperty<Document>]) -> String;

    fn format_accounts(&self, accounts: &[Account]) -> String;

    fn format_dashboard(&self, stats: &DashboardStats) -> String;

    fn format_policy(&self, report: &PolicyReport) -> String;

    /// Format a single record returned by a write.
    fn format_record(&self, action: &str, id: &str, record: &serde_json::Value) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl TableFormatter {
    fn render(header: Vec<&str>, rows: Vec<Vec<String>>) -> String {
        if rows.is_empty() {
            return "No results".to_string();
        }
        let mut table = Table::new();
        table.set_header(header);
        for row in rows {
            table.add_row(row);
        }
        table.to_string()
    }
}

fn money(value: f64) -> String {
    format!("R$ {:.2}", value)
}

fn owner(owner: Option<&str>) -> String {
    owner.unwrap_or("-").to_string()
}

impl Formatter for TableFormatter {
    fn format_properties(&self, properties: &[Property]) -> String {
        let rows = properties
            .iter()
            .map(|p| {
                vec![
                    p.id.clone(),
                    p.city.clone(),
                    p.address.clone(),
                    p.kind.to_string(),
                    money(p.price),
                    p.status.to_string(),
                    format!("{}/{}", p.bedrooms, p.bathrooms),
                    format!("{:.0} m²", p.area),
                    owner(p.owner_client_id.as_deref()),
                ]
            })
            .collect();
        Self::render(
            vec!["id", "city", "address", "kind", "price", "status", "bed/bath", "area", "owner"],
            rows,
        )
    }

    fn format_payments(&self, payments: &[WithProperty<Payment>]) -> String {
        let rows = payments
            .iter()
            .map(|view| {
                let p = &view.record;
                vec![
                    p.id.clone(),
                    view.property_label(),
                    money(p.amount),
                    p.due_date.to_string(),
                    p.paid_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                    p.status.to_string(),
                    p.description.clone(),
                    owner(p.owner_client_id.as_deref()),
                ]
            })
            .collect();
        Self::render(
            vec!["id", "property", "amount", "due", "paid", "status", "description", "owner"],
            rows,
        )
    }

    fn format_documents(&self, documents: &[WithProperty<Document>]) -> String {
        let rows = documents
            .iter()
            .map(|view| {
                let d = &view.record;
                vec![
                    d.id.clone(),
                    view.property_label(),
                    d.kind.to_string(),
                    d.name.clone(),
                    d.url.clone(),
                    owner(d.owner_client_id.as_deref()),
                ]
            })
            .collect();
        Self::render(vec!["id", "property", "kind", "name", "url", "owner"], rows)
    }

    fn format_accounts(&self, accounts: &[Account]) -> String {
        let rows = accounts
            .iter()
            .map(|a| {
                vec![
                    a.uid.clone(),
                    a.email.clone(),
                    a.display_name.clone(),
                    a.role.to_string(),
                    a.created_at.format("%Y-%m-%d").to_string(),
                ]
            })
            .collect();
        Self::render(vec!["uid", "email", "name", "role", "created"], rows)
    }

    fn format_dashboard(&self, stats: &DashboardStats) -> String {
        let mut table = Table::new();
        table.set_header(vec!["metric", "value"]);
        table.add_row(vec!["properties".to_string(), stats.total_properties.to_string()]);
        table.add_row(vec!["  for sale".to_string(), stats.properties_for_sale.to_string()]);
        table.add_row(vec!["  for rent".to_string(), stats.properties_for_rent.to_string()]);
        table.add_row(vec!["payments".to_string(), stats.total_payments.to_string()]);
        table.add_row(vec!["  pending".to_string(), stats.pending_payments.to_string()]);
        table.add_row(vec!["  late".to_string(), stats.late_payments.to_string()]);
        table.add_row(vec!["  outstanding".to_string(), money(stats.outstanding_amount)]);
        table.add_row(vec!["documents".to_string(), stats.total_documents.to_string()]);
        table.add_row(vec!["accounts".to_string(), stats.total_accounts.to_string()]);
        table.to_string()
    }

    fn format_policy(&self, report: &PolicyReport) -> String {
        let mut table = Table::new();
        table.set_header(vec!["collection", "visible", "create"]);
        for row in &report.collections {
            table.add_row(vec![
                row.collection.to_string(),
                row.visibility.to_string(),
                if row.can_create { "yes" } else { "no" }.to_string(),
            ]);
        }
        let role = report.role.map(|r| r.to_string()).unwrap_or_else(|| "(unrecognized)".to_string());
        format!(
            "role: {}  uid: {}\n{}",
            role,
            report.uid.as_deref().unwrap_or("-"),
            table
        )
    }

    fn format_record(&self, action: &str, id: &str, _record: &serde_json::Value) -> String {
        format!("{} {}", action, id)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl JsonFormatter {
    fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_properties(&self, properties: &[Property]) -> String {
        Self::pretty(properties)
    }

    fn format_payments(&self, payments: &[WithProperty<Payment>]) -> String {
        Self::pretty(payments)
    }

    fn format_documents(&self, documents: &[WithProperty<Document>]) -> String {
        Self::pretty(documents)
    }

    fn format_accounts(&self, accounts: &[Account]) -> String {
        Self::pretty(accounts)
    }

    fn format_dashboard(&self, stats: &DashboardStats) -> String {
        Self::pretty(stats)
    }

    fn format_policy(&self, report: &PolicyReport) -> String {
        Self::pretty(report)
    }

    fn format_record(&self, action: &str, _id: &str, record: &serde_json::Value) -> String {
        Self::pretty(&serde_json::json!({
            "action": action,
            "record": record,
        }))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({ "message": message }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realty_core::PropertyKind;

    #[test]
    fn test_empty_table() {
        assert_eq!(TableFormatter.format_properties(&[]), "No results");
    }

    #[test]
    fn test_property_table_has_owner_column() {
        let mut p = Property::new("Itajubá", PropertyKind::Rental, 1500.0);
        p.id = "p1".into();
        p.owner_client_id = Some("alice".into());
        let out = TableFormatter.format_properties(&[p]);
        assert!(out.contains("alice"));
        assert!(out.contains("R$ 1500.00"));
    }

    #[test]
    fn test_json_properties() {
        let p = Property::new("Itajubá", PropertyKind::Sale, 1.0);
        let out = JsonFormatter.format_properties(&[p]);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["city"], "Itajubá");
        assert_eq!(parsed[0]["kind"], "sale");
    }
}
