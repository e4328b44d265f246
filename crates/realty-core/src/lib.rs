//! Realty Core - record model, access policy, and guarded storage.
//!
//! This crate provides the back-office records (properties, payments,
//! documents, accounts), the role-based policy deciding who may see and
//! change them, and a repository that enforces that policy over an
//! embedded store.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod dashboard;
pub mod error;
pub mod model;
pub mod repository;
pub mod search;
pub mod security;
pub mod storage;
pub mod views;

pub use dashboard::DashboardStats;
pub use error::Error;
pub use model::{
    Account, CollectionKind, Document, DocumentKind, Payment, PaymentStatus, Property,
    PropertyKind, PropertyStatus, Record, Role,
};
pub use repository::Repository;
pub use search::{DocumentSearch, PaymentSearch, PropertySearch, RecordSearch};
pub use storage::{Insertion, RecordStore, StorageConfig, Stored};
pub use views::{PropertyLinked, WithProperty};

// Security exports
pub use security::{
    AccessPolicy, AuditEvent, AuditEventType, AuditLogger, Identity, MemoryAuditLogger,
    MutationOp, NullAuditLogger, SecurityError, SecurityResult, SessionResolver,
    TracingAuditLogger, VisibilityFilter,
};
