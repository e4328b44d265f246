//! Access control for the back office.
//!
//! This module provides:
//! - A single role-based decision table ([`AccessPolicy`]) for visibility,
//!   creation, mutation, and ownership stamping
//! - Explicit caller identities ([`Identity`]) passed into every call
//! - Row visibility predicates ([`VisibilityFilter`])
//! - Resolution of an authenticated uid to its role ([`SessionResolver`])
//! - Structured audit logging
//!
//! # Security Model
//!
//! The policy is pure and holds no state, so it gives the same answer
//! whether it runs in front of storage, behind it, or in a presentation
//! layer. The [`crate::Repository`] is the enforcement point: it consults
//! the policy immediately before every write and filters every read.
//!
//! # Example
//!
//! ```ignore
//! use realty_core::model::{CollectionKind, Role};
//! use realty_core::security::{AccessPolicy, Identity};
//!
//! let caller = Identity::new("u1", Role::Client);
//! let filter = AccessPolicy::visibility_filter(caller.role(), caller.uid(), CollectionKind::Property);
//! let mine = filter.apply(all_properties);
//! ```

pub mod audit;
pub mod error;
pub mod filter;
pub mod identity;
pub mod policy;
pub mod session;

// Error types
pub use error::{SecurityError, SecurityResult};

// Identity and policy
pub use filter::VisibilityFilter;
pub use identity::Identity;
pub use policy::AccessPolicy;
pub use session::SessionResolver;

// Audit types
pub use audit::{
    AuditEvent, AuditEventType, AuditLogger, MemoryAuditLogger, MutationOp, NullAuditLogger,
    TracingAuditLogger,
};
