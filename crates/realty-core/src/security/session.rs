//! Resolution of authenticated uids to identities.

use super::audit::{AuditEvent, AuditLogger, NullAuditLogger};
use super::identity::Identity;
use crate::model::Account;
use crate::storage::RecordStore;
use std::sync::Arc;

/// Looks up the role of an authenticated uid in the account collection.
///
/// The identity provider vouches for the uid; the role comes from the
/// stored account. Anything short of a readable account yields an identity
/// without a role.
pub struct SessionResolver {
    store: Arc<RecordStore>,
    audit: Arc<dyn AuditLogger>,
}

impl SessionResolver {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self {
            store,
            audit: Arc::new(NullAuditLogger),
        }
    }

    /// Report resolutions to an audit logger.
    pub fn with_audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// Resolve a uid. Never fails; unreadable accounts resolve without a role.
    pub fn resolve(&self, uid: &str) -> Identity {
        let unregistered = Identity::unregistered(uid);
        let Some(uid) = unregistered.uid() else {
            return Identity::anonymous();
        };

        let identity = match self.store.get::<Account>(uid) {
            Ok(Some(account)) => Identity::new(uid, account.role),
            Ok(None) => {
                tracing::debug!(uid, "no account for uid; registration incomplete");
                unregistered.clone()
            }
            Err(error) => {
                tracing::warn!(uid, %error, "failed to load account; resolving without role");
                unregistered.clone()
            }
        };

        self.audit
            .log(AuditEvent::session_resolved(&identity, identity.role().is_some()));
        identity
    }
}
