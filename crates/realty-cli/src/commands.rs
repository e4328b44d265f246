//! Subcommand definitions and execution.

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Subcommand};
use realty_core::{
    AccessPolicy, Account, CollectionKind, DashboardStats, Document, DocumentKind, DocumentSearch,
    Identity, Payment, PaymentSearch, PaymentStatus, Property, PropertyKind, PropertySearch,
    PropertyStatus, Record, RecordSearch, Repository, Role, VisibilityFilter,
};
use serde::Serialize;

use crate::error::CliError;
use crate::formatter::Formatter;

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Property listings
    #[command(subcommand)]
    Property(PropertyCommand),
    /// Payments
    #[command(subcommand)]
    Payment(PaymentCommand),
    /// Documents
    #[command(subcommand)]
    Document(DocumentCommand),
    /// Login accounts
    #[command(subcommand)]
    Account(AccountCommand),
    /// Counters over everything visible to the caller
    Dashboard,
    /// Inspect the access policy without touching storage
    #[command(subcommand)]
    Policy(PolicyCommand),
}

#[derive(Subcommand, Debug)]
pub enum PropertyCommand {
    /// List visible properties
    List {
        /// City substring
        #[arg(long)]
        city: Option<String>,
        #[arg(long, value_parser = parse_property_kind)]
        kind: Option<PropertyKind>,
        #[arg(long, value_parser = parse_property_status)]
        status: Option<PropertyStatus>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// Create a property
    Add {
        #[arg(long)]
        city: String,
        #[arg(long, value_parser = parse_property_kind)]
        kind: PropertyKind,
        #[arg(long)]
        price: f64,
        #[command(flatten)]
        fields: PropertyFields,
    },
    /// Update a property
    Update {
        id: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long, value_parser = parse_property_kind)]
        kind: Option<PropertyKind>,
        #[arg(long)]
        price: Option<f64>,
        #[command(flatten)]
        fields: PropertyFields,
    },
    /// Delete a property
    Delete { id: String },
}

/// Optional property fields shared by add and update.
#[derive(ClapArgs, Debug, Default)]
pub struct PropertyFields {
    #[arg(long)]
    address: Option<String>,
    #[arg(long, value_parser = parse_property_status)]
    status: Option<PropertyStatus>,
    #[arg(long)]
    bedrooms: Option<u32>,
    #[arg(long)]
    bathrooms: Option<u32>,
    /// Floor area in square metres
    #[arg(long)]
    area: Option<f64>,
    #[arg(long)]
    description: Option<String>,
}

impl PropertyFields {
    fn apply(self, property: &mut Property) {
        if let Some(v) = self.address {
            property.address = v;
        }
        if let Some(v) = self.status {
            property.status = v;
        }
        if let Some(v) = self.bedrooms {
            property.bedrooms = v;
        }
        if let Some(v) = self.bathrooms {
            property.bathrooms = v;
        }
        if let Some(v) = self.area {
            property.area = v;
        }
        if let Some(v) = self.description {
            property.description = v;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommand {
    /// List visible payments with their property
    List {
        #[arg(long, value_parser = parse_payment_status)]
        status: Option<PaymentStatus>,
        #[arg(long)]
        property: Option<String>,
    },
    /// Create a payment
    Add {
        #[arg(long)]
        property: String,
        #[arg(long)]
        amount: f64,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,
        #[arg(long, value_parser = parse_payment_status)]
        status: Option<PaymentStatus>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Update a payment
    Update {
        id: String,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Date paid (YYYY-MM-DD); marks the payment paid
        #[arg(long)]
        paid: Option<NaiveDate>,
        #[arg(long, value_parser = parse_payment_status)]
        status: Option<PaymentStatus>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a payment
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum DocumentCommand {
    /// List visible documents with their property
    List {
        #[arg(long, value_parser = parse_document_kind)]
        kind: Option<DocumentKind>,
        #[arg(long)]
        property: Option<String>,
    },
    /// File a document
    Add {
        #[arg(long)]
        property: String,
        #[arg(long, value_parser = parse_document_kind)]
        kind: DocumentKind,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Update a document
    Update {
        id: String,
        #[arg(long, value_parser = parse_document_kind)]
        kind: Option<DocumentKind>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a document
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Show the caller's uid and resolved role
    Whoami,
    /// List accounts (administrators only)
    List,
    /// Complete registration of the caller's own login as a client
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        /// CPF or CNPJ
        #[arg(long)]
        tax_id: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Make the caller the first administrator of an empty installation
    Bootstrap {
        #[arg(long)]
        email: String,
    },
    /// Create the account of another login (administrators only)
    Provision {
        uid: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        name: Option<String>,
    },
    /// Change the role of another login (administrators only)
    SetRole {
        uid: String,
        #[arg(value_parser = parse_role)]
        role: Role,
    },
    /// Delete the account of another login (administrators only)
    Delete { uid: String },
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Show visibility and create permission for a role string
    Check {
        /// Role string as issued by the identity provider; unknown values are shown as denied
        #[arg(long)]
        role: String,
        /// Caller uid
        #[arg(long = "as")]
        as_uid: Option<String>,
        /// Restrict to one collection
        #[arg(long, value_parser = parse_collection)]
        collection: Option<CollectionKind>,
    },
}

/// Policy decisions for one role, as printed by `policy check`.
#[derive(Debug, Serialize)]
pub struct PolicyReport {
    pub role: Option<Role>,
    pub uid: Option<String>,
    pub collections: Vec<PolicyRow>,
}

#[derive(Debug, Serialize)]
pub struct PolicyRow {
    pub collection: CollectionKind,
    pub visibility: VisibilityFilter,
    pub can_create: bool,
}

impl PolicyReport {
    /// Evaluate the policy for every requested collection.
    pub fn evaluate(role: &str, uid: Option<&str>, only: Option<CollectionKind>) -> Self {
        let identity = Identity::from_claims(uid, Some(role));
        let collections = CollectionKind::ALL
            .into_iter()
            .filter(|c| only.map_or(true, |o| o == *c))
            .map(|collection| PolicyRow {
                collection,
                visibility: AccessPolicy::visibility_filter(identity.role(), identity.uid(), collection),
                can_create: AccessPolicy::can_create(identity.role(), collection),
            })
            .collect();
        Self {
            role: identity.role(),
            uid: identity.uid().map(String::from),
            collections,
        }
    }
}

/// Execute a command for the given caller.
pub fn execute(
    command: Command,
    repo: &Repository,
    identity: &Identity,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    match command {
        Command::Property(cmd) => execute_property(cmd, repo, identity, formatter),
        Command::Payment(cmd) => execute_payment(cmd, repo, identity, formatter),
        Command::Document(cmd) => execute_document(cmd, repo, identity, formatter),
        Command::Account(cmd) => execute_account(cmd, repo, identity, formatter),
        Command::Dashboard => {
            let stats = DashboardStats::collect(repo, identity)?;
            Ok(formatter.format_dashboard(&stats))
        }
        Command::Policy(cmd) => Ok(execute_policy(cmd, formatter)),
    }
}

/// Evaluate a policy command. Touches no storage.
pub fn execute_policy(cmd: PolicyCommand, formatter: &dyn Formatter) -> String {
    match cmd {
        PolicyCommand::Check {
            role,
            as_uid,
            collection,
        } => {
            let report = PolicyReport::evaluate(&role, as_uid.as_deref(), collection);
            formatter.format_policy(&report)
        }
    }
}

fn written<R: Record>(formatter: &dyn Formatter, action: &str, record: &R) -> Result<String, CliError> {
    let value = serde_json::to_value(record)?;
    Ok(formatter.format_record(action, record.id(), &value))
}

/// Load a record for editing, reporting invisible records as missing.
fn load<R: Record>(repo: &Repository, identity: &Identity, id: &str) -> Result<R, CliError> {
    repo.get::<R>(identity, id)?.ok_or_else(|| CliError::NotFound {
        collection: R::KIND,
        id: id.to_string(),
    })
}

fn execute_property(
    cmd: PropertyCommand,
    repo: &Repository,
    identity: &Identity,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    match cmd {
        PropertyCommand::List {
            city,
            kind,
            status,
            min_price,
            max_price,
        } => {
            let search = PropertySearch {
                city: city.filter(|c| !c.trim().is_empty()),
                kind,
                status,
                min_price,
                max_price,
            };
            let properties = repo.search::<Property, _>(identity, &search)?;
            Ok(formatter.format_properties(&properties))
        }
        PropertyCommand::Add {
            city,
            kind,
            price,
            fields,
        } => {
            let mut property = Property::new(city, kind, price);
            fields.apply(&mut property);
            let created = repo.create(identity, property)?;
            written(formatter, "created", &created)
        }
        PropertyCommand::Update {
            id,
            city,
            kind,
            price,
            fields,
        } => {
            let mut property: Property = load(repo, identity, &id)?;
            if let Some(v) = city {
                property.city = v;
            }
            if let Some(v) = kind {
                property.kind = v;
            }
            if let Some(v) = price {
                property.price = v;
            }
            fields.apply(&mut property);
            let updated = repo.update(identity, &id, property)?;
            written(formatter, "updated", &updated)
        }
        PropertyCommand::Delete { id } => {
            let removed: Property = repo.delete(identity, &id)?;
            written(formatter, "deleted", &removed)
        }
    }
}

fn execute_payment(
    cmd: PaymentCommand,
    repo: &Repository,
    identity: &Identity,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    match cmd {
        PaymentCommand::List { status, property } => {
            let search = PaymentSearch {
                status,
                property_id: property,
            };
            let mut payments = repo.with_property::<Payment>(identity)?;
            payments.retain(|view| search.matches(&view.record));
            Ok(formatter.format_payments(&payments))
        }
        PaymentCommand::Add {
            property,
            amount,
            due,
            status,
            description,
        } => {
            let mut payment = Payment::new(property, amount, due);
            if let Some(v) = status {
                payment.status = v;
            }
            if let Some(v) = description {
                payment.description = v;
            }
            let created = repo.create(identity, payment)?;
            written(formatter, "created", &created)
        }
        PaymentCommand::Update {
            id,
            amount,
            due,
            paid,
            status,
            description,
        } => {
            let mut payment: Payment = load(repo, identity, &id)?;
            if let Some(v) = amount {
                payment.amount = v;
            }
            if let Some(v) = due {
                payment.due_date = v;
            }
            if let Some(v) = paid {
                payment = payment.paid_on(v);
            }
            if let Some(v) = status {
                payment.status = v;
            }
            if let Some(v) = description {
                payment.description = v;
            }
            let updated = repo.update(identity, &id, payment)?;
            written(formatter, "updated", &updated)
        }
        PaymentCommand::Delete { id } => {
            let removed: Payment = repo.delete(identity, &id)?;
            written(formatter, "deleted", &removed)
        }
    }
}

fn execute_document(
    cmd: DocumentCommand,
    repo: &Repository,
    identity: &Identity,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    match cmd {
        DocumentCommand::List { kind, property } => {
            let search = DocumentSearch {
                kind,
                property_id: property,
            };
            let mut documents = repo.with_property::<Document>(identity)?;
            documents.retain(|view| search.matches(&view.record));
            Ok(formatter.format_documents(&documents))
        }
        DocumentCommand::Add {
            property,
            kind,
            name,
            url,
            description,
        } => {
            let mut document = Document::new(property, kind, name);
            if let Some(v) = url {
                document.url = v;
            }
            if let Some(v) = description {
                document.description = v;
            }
            let created = repo.create(identity, document)?;
            written(formatter, "created", &created)
        }
        DocumentCommand::Update {
            id,
            kind,
            name,
            url,
            description,
        } => {
            let mut document: Document = load(repo, identity, &id)?;
            if let Some(v) = kind {
                document.kind = v;
            }
            if let Some(v) = name {
                document.name = v;
            }
            if let Some(v) = url {
                document.url = v;
            }
            if let Some(v) = description {
                document.description = v;
            }
            let updated = repo.update(identity, &id, document)?;
            written(formatter, "updated", &updated)
        }
        DocumentCommand::Delete { id } => {
            let removed: Document = repo.delete(identity, &id)?;
            written(formatter, "deleted", &removed)
        }
    }
}

fn execute_account(
    cmd: AccountCommand,
    repo: &Repository,
    identity: &Identity,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    match cmd {
        AccountCommand::Whoami => Ok(formatter.format_message(&identity.to_string())),
        AccountCommand::List => {
            let accounts = repo.list::<Account>(identity)?;
            Ok(formatter.format_accounts(&accounts))
        }
        AccountCommand::Register {
            email,
            name,
            tax_id,
            phone,
        } => {
            let mut account = Account::new("", email, Role::Client);
            account.display_name = name.unwrap_or_default();
            account.tax_id = tax_id;
            account.phone = phone;
            let created = repo.register_account(identity, account)?;
            written(formatter, "registered", &created)
        }
        AccountCommand::Bootstrap { email } => {
            let uid = identity.uid().ok_or(CliError::MissingUid)?;
            let created = repo.bootstrap_admin(uid, &email)?;
            written(formatter, "bootstrapped", &created)
        }
        AccountCommand::Provision {
            uid,
            email,
            role,
            name,
        } => {
            let account = Account::new(uid, email, role).with_display_name(name.unwrap_or_default());
            let created = repo.provision_account(identity, account)?;
            written(formatter, "provisioned", &created)
        }
        AccountCommand::SetRole { uid, role } => {
            let mut account: Account = load(repo, identity, &uid)?;
            account.role = role;
            let updated = repo.update(identity, &uid, account)?;
            written(formatter, "updated", &updated)
        }
        AccountCommand::Delete { uid } => {
            let removed: Account = repo.delete(identity, &uid)?;
            written(formatter, "deleted", &removed)
        }
    }
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse()
}

fn parse_collection(s: &str) -> Result<CollectionKind, String> {
    CollectionKind::parse(s).ok_or_else(|| format!("unknown collection '{}'", s))
}

fn parse_property_kind(s: &str) -> Result<PropertyKind, String> {
    PropertyKind::parse(s).ok_or_else(|| format!("unknown property kind '{}' (sale, rental)", s))
}

fn parse_property_status(s: &str) -> Result<PropertyStatus, String> {
    PropertyStatus::parse(s).ok_or_else(|| format!("unknown status '{}' (available, unavailable)", s))
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, String> {
    PaymentStatus::parse(s).ok_or_else(|| format!("unknown status '{}' (pending, paid, late)", s))
}

fn parse_document_kind(s: &str) -> Result<DocumentKind, String> {
    DocumentKind::parse(s).ok_or_else(|| {
        format!(
            "unknown document kind '{}' (contract, deed, tax-id, id-card, receipt, other)",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::JsonFormatter;
    use realty_core::RecordStore;
    use std::sync::Arc;

    fn repo() -> Repository {
        Repository::new(Arc::new(RecordStore::temporary().unwrap()))
    }

    #[test]
    fn test_policy_report_unknown_role() {
        let report = PolicyReport::evaluate("superuser", Some("u1"), None);
        assert_eq!(report.role, None);
        assert_eq!(report.collections.len(), 4);
        assert!(report.collections.iter().all(|r| !r.can_create && r.visibility.is_deny_all()));
    }

    #[test]
    fn test_policy_report_client() {
        let report = PolicyReport::evaluate("cliente", Some("u1"), Some(CollectionKind::Property));
        assert_eq!(report.role, Some(Role::Client));
        assert_eq!(report.collections.len(), 1);
        assert_eq!(report.collections[0].visibility, VisibilityFilter::OwnedBy("u1".into()));
        assert!(report.collections[0].can_create);
    }

    #[test]
    fn test_update_of_invisible_record_is_not_found() {
        let repo = repo();
        let alice = Identity::new("alice", Role::Client);
        let bruno = Identity::new("bruno", Role::Client);
        let created = repo
            .create(&alice, Property::new("Itajubá", PropertyKind::Sale, 1.0))
            .unwrap();

        let cmd = Command::Property(PropertyCommand::Update {
            id: created.id.clone(),
            city: None,
            kind: None,
            price: Some(2.0),
            fields: PropertyFields::default(),
        });
        let err = execute(cmd, &repo, &bruno, &JsonFormatter).unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));
    }

    #[test]
    fn test_property_add_and_list() {
        let repo = repo();
        let alice = Identity::new("alice", Role::Client);
        let add = Command::Property(PropertyCommand::Add {
            city: "Itajubá".into(),
            kind: PropertyKind::Rental,
            price: 1500.0,
            fields: PropertyFields::default(),
        });
        execute(add, &repo, &alice, &JsonFormatter).unwrap();

        let list = Command::Property(PropertyCommand::List {
            city: Some("itaj".into()),
            kind: None,
            status: None,
            min_price: None,
            max_price: None,
        });
        let out = execute(list, &repo, &alice, &JsonFormatter).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["owner_client_id"], "alice");
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = || realty_core::StorageConfig::new(dir.path());
        let alice = Identity::new("alice", Role::Client);

        {
            let store = Arc::new(RecordStore::open(config()).unwrap());
            let repo = Repository::new(store.clone());
            let add = Command::Property(PropertyCommand::Add {
                city: "Pouso Alegre".into(),
                kind: PropertyKind::Sale,
                price: 250_000.0,
                fields: PropertyFields::default(),
            });
            execute(add, &repo, &alice, &JsonFormatter).unwrap();
            store.flush().unwrap();
        }

        let repo = Repository::new(Arc::new(RecordStore::open(config()).unwrap()));
        let out = execute(Command::Dashboard, &repo, &alice, &JsonFormatter).unwrap();
        let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(stats["total_properties"], 1);
        assert_eq!(stats["properties_for_sale"], 1);
    }
}
