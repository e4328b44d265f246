//! Audit logging of access decisions and writes.

use super::identity::Identity;
use crate::model::CollectionKind;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter for event sequence numbers.
static EVENT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Kind of write performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationOp::Create => write!(f, "create"),
            MutationOp::Update => write!(f, "update"),
            MutationOp::Delete => write!(f, "delete"),
        }
    }
}

/// Types of audit events.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEventType {
    /// A collection was read.
    Query {
        /// Collection read.
        collection: CollectionKind,
        /// Visibility filter applied, in display form.
        filter: String,
        /// Number of records returned.
        result_count: usize,
    },
    /// A record was written.
    Mutation {
        /// Collection written.
        collection: CollectionKind,
        /// Kind of write.
        operation: MutationOp,
        /// Affected record.
        record_id: String,
    },
    /// A write was refused.
    AccessDenied {
        /// Operation attempted.
        operation: MutationOp,
        /// Collection targeted.
        collection: CollectionKind,
        /// Targeted record, if the write addressed one.
        record_id: Option<String>,
        /// Reason for denial.
        reason: String,
    },
    /// A uid was resolved to a role.
    SessionResolved {
        /// Whether an account record was found.
        registered: bool,
    },
}

/// An audit event with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Process-wide sequence number.
    pub sequence: u64,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Caller uid, if known.
    pub uid: Option<String>,
    /// Caller role, if known.
    pub role: Option<String>,
    /// Event details.
    pub event_type: AuditEventType,
}

impl AuditEvent {
    /// Create a new audit event for a caller.
    pub fn new(identity: &Identity, event_type: AuditEventType) -> Self {
        Self {
            sequence: EVENT_COUNTER.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            uid: identity.uid().map(String::from),
            role: identity.role().map(|r| r.to_string()),
            event_type,
        }
    }

    /// Create a query event.
    pub fn query(
        identity: &Identity,
        collection: CollectionKind,
        filter: impl fmt::Display,
        result_count: usize,
    ) -> Self {
        Self::new(
            identity,
            AuditEventType::Query {
                collection,
                filter: filter.to_string(),
                result_count,
            },
        )
    }

    /// Create a mutation event.
    pub fn mutation(
        identity: &Identity,
        collection: CollectionKind,
        operation: MutationOp,
        record_id: impl Into<String>,
    ) -> Self {
        Self::new(
            identity,
            AuditEventType::Mutation {
                collection,
                operation,
                record_id: record_id.into(),
            },
        )
    }

    /// Create an access denied event.
    pub fn access_denied(
        identity: &Identity,
        operation: MutationOp,
        collection: CollectionKind,
        record_id: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            identity,
            AuditEventType::AccessDenied {
                operation,
                collection,
                record_id,
                reason: reason.into(),
            },
        )
    }

    /// Create a session resolution event.
    pub fn session_resolved(identity: &Identity, registered: bool) -> Self {
        Self::new(identity, AuditEventType::SessionResolved { registered })
    }

    /// Whether this event records a refusal.
    pub fn is_denial(&self) -> bool {
        matches!(self.event_type, AuditEventType::AccessDenied { .. })
    }

    /// Format the event as a log line.
    pub fn to_log_line(&self) -> String {
        let event_desc = match &self.event_type {
            AuditEventType::Query {
                collection,
                filter,
                result_count,
            } => format!(
                "QUERY collection={} filter=\"{}\" results={}",
                collection, filter, result_count
            ),
            AuditEventType::Mutation {
                collection,
                operation,
                record_id,
            } => format!(
                "MUTATION collection={} op={} id={}",
                collection, operation, record_id
            ),
            AuditEventType::AccessDenied {
                operation,
                collection,
                record_id,
                reason,
            } => format!(
                "ACCESS_DENIED op={} collection={} id={} reason={}",
                operation,
                collection,
                record_id.as_deref().unwrap_or("-"),
                reason
            ),
            AuditEventType::SessionResolved { registered } => {
                format!("SESSION registered={}", registered)
            }
        };

        format!(
            "{} seq={} uid={} role={} {}",
            self.timestamp.to_rfc3339(),
            self.sequence,
            self.uid.as_deref().unwrap_or("-"),
            self.role.as_deref().unwrap_or("-"),
            event_desc
        )
    }
}

/// Trait for audit log backends.
pub trait AuditLogger: Send + Sync {
    /// Log an audit event.
    fn log(&self, event: AuditEvent);
}

/// In-memory audit logger for testing.
#[derive(Debug, Default, Clone)]
pub struct MemoryAuditLogger {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditLogger {
    /// Create a new memory logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all logged events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Get only denial events.
    pub fn denials(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().filter(|e| e.is_denial()).cloned().collect()
    }

    /// Clear all events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl AuditLogger for MemoryAuditLogger {
    fn log(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}

/// No-op audit logger that discards all events.
#[derive(Debug, Default)]
pub struct NullAuditLogger;

impl AuditLogger for NullAuditLogger {
    fn log(&self, _event: AuditEvent) {}
}

/// Audit logger that forwards events to `tracing` under the `audit` target.
#[derive(Debug, Default)]
pub struct TracingAuditLogger;

impl AuditLogger for TracingAuditLogger {
    fn log(&self, event: AuditEvent) {
        if event.is_denial() {
            tracing::warn!(target: "audit", "{}", event.to_log_line());
        } else {
            tracing::info!(target: "audit", "{}", event.to_log_line());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn client() -> Identity {
        Identity::new("u-1", Role::Client)
    }

    #[test]
    fn test_query_event() {
        let event = AuditEvent::query(&client(), CollectionKind::Property, "owner_client_id = u-1", 3);
        assert_eq!(event.uid.as_deref(), Some("u-1"));
        assert_eq!(event.role.as_deref(), Some("client"));
        match event.event_type {
            AuditEventType::Query { collection, result_count, .. } => {
                assert_eq!(collection, CollectionKind::Property);
                assert_eq!(result_count, 3);
            }
            _ => panic!("Expected Query event"),
        }
    }

    #[test]
    fn test_access_denied_line() {
        let event = AuditEvent::access_denied(
            &Identity::anonymous(),
            MutationOp::Delete,
            CollectionKind::Account,
            Some("u-2".into()),
            "no role",
        );
        assert!(event.is_denial());
        let line = event.to_log_line();
        assert!(line.contains("ACCESS_DENIED op=delete collection=account id=u-2"));
        assert!(line.contains("uid=- role=-"));
    }

    #[test]
    fn test_sequence_increases() {
        let a = AuditEvent::session_resolved(&client(), true);
        let b = AuditEvent::session_resolved(&client(), true);
        assert!(b.sequence > a.sequence);
    }

    #[test]
    fn test_memory_logger() {
        let logger = MemoryAuditLogger::new();
        logger.log(AuditEvent::mutation(&client(), CollectionKind::Document, MutationOp::Create, "d-1"));
        logger.log(AuditEvent::access_denied(
            &client(),
            MutationOp::Create,
            CollectionKind::Account,
            None,
            "admin only",
        ));
        assert_eq!(logger.len(), 2);
        assert_eq!(logger.denials().len(), 1);
        logger.clear();
        assert!(logger.is_empty());
    }

    #[test]
    fn test_null_logger() {
        NullAuditLogger.log(AuditEvent::session_resolved(&client(), false));
    }
}
