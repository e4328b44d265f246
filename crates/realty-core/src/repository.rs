//! Guarded data access.
//!
//! The repository is where the access policy is enforced. Reads are passed
//! through the caller's visibility filter after they leave storage; writes
//! are checked against the stored record in the same call that performs
//! them. Every read, write, and refusal is reported to the audit logger.

use crate::model::{Account, CollectionKind, Property, Record, Role};
use crate::search::RecordSearch;
use crate::security::{
    AccessPolicy, AuditEvent, AuditLogger, Identity, MutationOp, NullAuditLogger, SecurityError,
    SecurityResult, VisibilityFilter,
};
use crate::storage::{Insertion, RecordStore, Stored};
use crate::views::{PropertyLinked, WithProperty};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

/// Policy-enforcing access to the record store.
#[derive(Clone)]
pub struct Repository {
    store: Arc<RecordStore>,
    audit: Arc<dyn AuditLogger>,
}

impl Repository {
    /// Create a repository over the given store.
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self {
            store,
            audit: Arc::new(NullAuditLogger),
        }
    }

    /// Report operations to an audit logger.
    pub fn with_audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// The caller's visibility filter for a collection.
    pub fn visibility(&self, identity: &Identity, collection: CollectionKind) -> VisibilityFilter {
        AccessPolicy::visibility_filter(identity.role(), identity.uid(), collection)
    }

    /// Every record of a collection the caller may see.
    pub fn list<R: Record>(&self, identity: &Identity) -> SecurityResult<Vec<R>> {
        let filter = self.visibility(identity, R::KIND);
        let records = if filter.is_deny_all() {
            Vec::new()
        } else {
            filter.apply(self.store.scan::<R>()?)
        };

        tracing::debug!(
            collection = %R::KIND,
            caller = %identity,
            %filter,
            results = records.len(),
            "listed records"
        );
        self.audit
            .log(AuditEvent::query(identity, R::KIND, &filter, records.len()));
        Ok(records)
    }

    /// Visible records that also satisfy `search`.
    pub fn search<R, S>(&self, identity: &Identity, search: &S) -> SecurityResult<Vec<R>>
    where
        R: Record,
        S: RecordSearch<R>,
    {
        let mut records = self.list::<R>(identity)?;
        records.retain(|r| search.matches(r));
        Ok(records)
    }

    /// A single record, or `None` if it is missing or not visible.
    pub fn get<R: Record>(&self, identity: &Identity, id: &str) -> SecurityResult<Option<R>> {
        let filter = self.visibility(identity, R::KIND);
        if filter.is_deny_all() {
            return Ok(None);
        }
        Ok(self.store.get::<R>(id)?.filter(|r| filter.matches(r)))
    }

    /// Create a record on behalf of the caller.
    ///
    /// Business records get a fresh id and are attributed by
    /// [`AccessPolicy::stamp_ownership`]; account records keep their uid and
    /// must not already exist.
    pub fn create<R: Record>(&self, identity: &Identity, mut record: R) -> SecurityResult<R> {
        if let Err(err) = AccessPolicy::require_create(identity.role(), R::KIND) {
            return Err(self.deny(identity, MutationOp::Create, R::KIND, None, err));
        }
        if identity.role() == Some(Role::Client) && identity.uid().is_none() {
            let err = SecurityError::InvalidIdentity("client identity has no uid".to_string());
            return Err(self.deny(identity, MutationOp::Create, R::KIND, None, err));
        }
        self.require_linked_property(identity, MutationOp::Create, None, &record, None)?;

        let now = Utc::now();
        if R::KIND.is_owner_scoped() {
            record.set_id(RecordStore::generate_id());
        } else if record.id().trim().is_empty() {
            return Err(SecurityError::InvalidIdentity(format!(
                "{} record requires an id",
                R::KIND
            )));
        }
        record.set_created_at(now);
        record.set_updated_at(now);
        let record = AccessPolicy::stamp_ownership(identity.role(), identity.uid(), record);

        if !self.store.insert_new(&record)? {
            return Err(SecurityError::AlreadyExists {
                collection: R::KIND,
                id: record.id().to_string(),
            });
        }

        tracing::info!(
            collection = %R::KIND,
            id = record.id(),
            caller = %identity,
            owner = record.owner_client_id().unwrap_or("-"),
            "record created"
        );
        self.audit.log(AuditEvent::mutation(
            identity,
            R::KIND,
            MutationOp::Create,
            record.id(),
        ));
        Ok(record)
    }

    /// Replace a record the caller may modify.
    ///
    /// The stored id, creation time, and owner are kept; only the remaining
    /// fields come from `record`. The write only lands on the exact record
    /// that was checked; if it changed or vanished in between, the update
    /// fails with [`SecurityError::Conflict`].
    pub fn update<R: Record>(&self, identity: &Identity, id: &str, record: R) -> SecurityResult<R> {
        let stored = self.load_for_write::<R>(identity, MutationOp::Update, id)?;
        let existing = &stored.record;
        self.require_linked_property(identity, MutationOp::Update, Some(id), &record, Some(existing))?;

        let mut updated = AccessPolicy::preserve_ownership(existing, record);
        updated.set_id(existing.id().to_string());
        if let Some(created) = existing.created_at() {
            updated.set_created_at(created);
        }
        updated.set_updated_at(Utc::now());
        if !self.store.replace(&stored, &updated)? {
            return Err(self.conflict::<R>(id));
        }

        tracing::info!(collection = %R::KIND, id, caller = %identity, "record updated");
        self.audit
            .log(AuditEvent::mutation(identity, R::KIND, MutationOp::Update, id));
        Ok(updated)
    }

    /// Delete a record the caller may modify. Returns the removed record.
    pub fn delete<R: Record>(&self, identity: &Identity, id: &str) -> SecurityResult<R> {
        let stored = self.load_for_write::<R>(identity, MutationOp::Delete, id)?;
        if !self.store.remove_stored(&stored)? {
            return Err(self.conflict::<R>(id));
        }

        tracing::info!(collection = %R::KIND, id, caller = %identity, "record deleted");
        self.audit
            .log(AuditEvent::mutation(identity, R::KIND, MutationOp::Delete, id));
        Ok(stored.into_record())
    }

    /// Fetch the target of a write and check the caller may modify it.
    ///
    /// Records the caller cannot see are reported as missing, so a write
    /// attempt cannot be used to probe for other clients' records.
    fn load_for_write<R: Record>(
        &self,
        identity: &Identity,
        op: MutationOp,
        id: &str,
    ) -> SecurityResult<Stored<R>> {
        let not_found = || SecurityError::NotFound {
            collection: R::KIND,
            id: id.to_string(),
        };
        let filter = self.visibility(identity, R::KIND);
        let existing = match self.store.fetch::<R>(id)? {
            Some(stored) if filter.matches(&stored.record) => stored,
            Some(_) => {
                return Err(self.deny(identity, op, R::KIND, Some(id), not_found()));
            }
            None => return Err(not_found()),
        };

        if let Err(err) = AccessPolicy::require_mutate(identity.role(), identity.uid(), &existing.record) {
            return Err(self.deny(identity, op, R::KIND, Some(id), err));
        }
        Ok(existing)
    }

    /// A client may only file records under a property they can see.
    ///
    /// References that did not change on update are left alone, so records
    /// under a since-deleted property stay editable.
    fn require_linked_property<R: Record>(
        &self,
        identity: &Identity,
        op: MutationOp,
        id: Option<&str>,
        record: &R,
        previous: Option<&R>,
    ) -> SecurityResult<()> {
        if identity.role() != Some(Role::Client) {
            return Ok(());
        }
        let Some(property_id) = record.linked_property_id() else {
            return Ok(());
        };
        if previous.and_then(|p| p.linked_property_id()) == Some(property_id) {
            return Ok(());
        }
        if self.get::<Property>(identity, property_id)?.is_some() {
            return Ok(());
        }
        let err = SecurityError::NotFound {
            collection: CollectionKind::Property,
            id: property_id.to_string(),
        };
        Err(self.deny(identity, op, R::KIND, id, err))
    }

    fn conflict<R: Record>(&self, id: &str) -> SecurityError {
        tracing::warn!(collection = %R::KIND, id, "record changed during write");
        SecurityError::Conflict {
            collection: R::KIND,
            id: id.to_string(),
        }
    }

    fn deny(
        &self,
        identity: &Identity,
        op: MutationOp,
        collection: CollectionKind,
        id: Option<&str>,
        err: SecurityError,
    ) -> SecurityError {
        tracing::warn!(
            %collection,
            op = %op,
            id = id.unwrap_or("-"),
            caller = %identity,
            reason = %err,
            "write refused"
        );
        self.audit.log(AuditEvent::access_denied(
            identity,
            op,
            collection,
            id.map(String::from),
            err.to_string(),
        ));
        err
    }

    // ========== Accounts ==========

    /// Provision the account record of another login. Administrators only.
    pub fn provision_account(&self, identity: &Identity, account: Account) -> SecurityResult<Account> {
        self.create(identity, account)
    }

    /// Complete registration for the caller's own login.
    ///
    /// Self-registration always yields a client account; elevated roles are
    /// granted by an administrator through [`Repository::update`].
    pub fn register_account(&self, identity: &Identity, mut account: Account) -> SecurityResult<Account> {
        let Some(uid) = identity.uid() else {
            return Err(SecurityError::InvalidIdentity(
                "registration requires an authenticated uid".to_string(),
            ));
        };
        if account.role != Role::Client {
            tracing::info!(uid, requested = %account.role, "self-registration downgraded to client");
        }
        account.uid = uid.to_string();
        account.role = Role::Client;
        account.created_at = Utc::now();
        self.insert_account(identity, account)
    }

    /// Create the first administrator of an installation that has never
    /// held an account.
    ///
    /// The emptiness check and the insert are one storage transaction, so
    /// concurrent bootstraps yield exactly one administrator.
    pub fn bootstrap_admin(&self, uid: &str, email: &str) -> SecurityResult<Account> {
        let identity = Identity::unregistered(uid);
        let Some(uid) = identity.uid() else {
            return Err(SecurityError::InvalidIdentity("bootstrap requires a uid".to_string()));
        };
        let account = Account::new(uid, email, Role::Admin).with_display_name("Administrator");
        match self.store.insert_first(&account)? {
            Insertion::Inserted => self.account_created(&identity, account),
            Insertion::NotFirst | Insertion::Exists => {
                let err = SecurityError::PermissionDenied(
                    "accounts already exist; ask an administrator".to_string(),
                );
                Err(self.deny(&identity, MutationOp::Create, CollectionKind::Account, Some(uid), err))
            }
        }
    }

    fn insert_account(&self, identity: &Identity, account: Account) -> SecurityResult<Account> {
        if !self.store.insert_new(&account)? {
            return Err(SecurityError::AlreadyExists {
                collection: CollectionKind::Account,
                id: account.uid,
            });
        }
        self.account_created(identity, account)
    }

    fn account_created(&self, identity: &Identity, account: Account) -> SecurityResult<Account> {
        tracing::info!(uid = %account.uid, role = %account.role, "account created");
        self.audit.log(AuditEvent::mutation(
            identity,
            CollectionKind::Account,
            MutationOp::Create,
            account.uid.as_str(),
        ));
        Ok(account)
    }

    // ========== Joins ==========

    /// Visible records paired with the property they reference.
    ///
    /// A reference to a deleted property, or to one the caller cannot see,
    /// produces `property: None`.
    pub fn with_property<R>(&self, identity: &Identity) -> SecurityResult<Vec<WithProperty<R>>>
    where
        R: Record + PropertyLinked,
    {
        let records = self.list::<R>(identity)?;
        let properties: HashMap<String, Property> = self
            .list::<Property>(identity)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(records
            .into_iter()
            .map(|record| {
                let property = properties.get(record.property_id()).cloned();
                WithProperty { record, property }
            })
            .collect())
    }
}
