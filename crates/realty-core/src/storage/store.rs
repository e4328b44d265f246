//! Record store backed by sled.
//!
//! Each collection lives in its own tree, keyed by record id (accounts by
//! uid) with the record serialized as JSON. The store applies no access
//! control: callers go through [`crate::Repository`].
//!
//! Writes that depend on what was read are conditional: inserts fail on an
//! existing key, and replacements and removals only apply if the stored
//! bytes are still the ones the caller checked.

use super::StorageConfig;
use crate::error::Error;
use crate::model::{CollectionKind, Record};
use sled::transaction::{abort, ConflictableTransactionResult, TransactionError};
use sled::{Db, IVec, Transactional, Tree};

/// Metadata tree holding per-collection markers.
const META_TREE: &str = "meta";

/// Outcome of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The record was written.
    Inserted,
    /// A record with the same id already exists.
    Exists,
    /// The collection has held records before.
    NotFirst,
}

/// A record together with the bytes it was read from.
#[derive(Debug, Clone)]
pub struct Stored<R> {
    pub record: R,
    raw: IVec,
}

impl<R> Stored<R> {
    /// Take the record.
    pub fn into_record(self) -> R {
        self.record
    }
}

/// Persistent store for the four collections.
pub struct RecordStore {
    db: Db,
    meta: Tree,
    properties: Tree,
    payments: Tree,
    documents: Tree,
    accounts: Tree,
}

impl RecordStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let store = Self {
            meta: db.open_tree(META_TREE)?,
            properties: db.open_tree(CollectionKind::Property.tree_name())?,
            payments: db.open_tree(CollectionKind::Payment.tree_name())?,
            documents: db.open_tree(CollectionKind::Document.tree_name())?,
            accounts: db.open_tree(CollectionKind::Account.tree_name())?,
            db,
        };

        // Stores written before the markers existed.
        for kind in CollectionKind::ALL {
            if !store.tree(kind).is_empty() {
                store.meta.insert(Self::marker(kind).as_bytes(), &[1u8][..])?;
            }
        }

        tracing::debug!(
            path = %config.path.display(),
            temporary = config.temporary,
            recovered = store.db.was_recovered(),
            "record store opened"
        );
        Ok(store)
    }

    /// Open a throwaway in-memory store.
    pub fn temporary() -> Result<Self, Error> {
        Self::open(StorageConfig::temporary())
    }

    fn tree(&self, collection: CollectionKind) -> &Tree {
        match collection {
            CollectionKind::Property => &self.properties,
            CollectionKind::Payment => &self.payments,
            CollectionKind::Document => &self.documents,
            CollectionKind::Account => &self.accounts,
        }
    }

    fn marker(collection: CollectionKind) -> String {
        format!("seen:{}", collection.tree_name())
    }

    /// Insert a record only if its id is unused. Returns false on conflict.
    pub fn insert_new<R: Record>(&self, record: &R) -> Result<bool, Error> {
        Ok(self.insert_checked(record, false)? == Insertion::Inserted)
    }

    /// Insert a record only if its collection has never held one.
    ///
    /// The check and the write happen in one transaction, so of several
    /// concurrent callers at most one succeeds.
    pub fn insert_first<R: Record>(&self, record: &R) -> Result<Insertion, Error> {
        self.insert_checked(record, true)
    }

    fn insert_checked<R: Record>(&self, record: &R, first: bool) -> Result<Insertion, Error> {
        if record.id().is_empty() {
            return Err(Error::MissingId);
        }
        let value = IVec::from(Self::encode(record)?);
        let key = record.id().as_bytes();
        let marker = Self::marker(R::KIND);

        let result = (&self.meta, self.tree(R::KIND)).transaction(
            |(meta, tree)| -> ConflictableTransactionResult<Insertion, Insertion> {
                if first && meta.get(marker.as_bytes())?.is_some() {
                    return abort(Insertion::NotFirst);
                }
                if tree.get(key)?.is_some() {
                    return abort(Insertion::Exists);
                }
                tree.insert(key, value.clone())?;
                meta.insert(marker.as_bytes(), &[1u8][..])?;
                Ok(Insertion::Inserted)
            },
        );

        match result {
            Ok(outcome) | Err(TransactionError::Abort(outcome)) => Ok(outcome),
            Err(TransactionError::Storage(err)) => Err(Error::Storage(err)),
        }
    }

    /// Fetch a record by id.
    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>, Error> {
        Ok(self.fetch::<R>(id)?.map(Stored::into_record))
    }

    /// Fetch a record by id along with its stored bytes, for a later
    /// [`replace`](Self::replace) or [`remove_stored`](Self::remove_stored).
    pub fn fetch<R: Record>(&self, id: &str) -> Result<Option<Stored<R>>, Error> {
        match self.tree(R::KIND).get(id.as_bytes())? {
            Some(raw) => Ok(Some(Stored {
                record: Self::decode(&raw)?,
                raw,
            })),
            None => Ok(None),
        }
    }

    /// Overwrite `current` with `updated`, keyed by the current id.
    ///
    /// Returns false, writing nothing, if the stored record was changed or
    /// removed since `current` was fetched.
    pub fn replace<R: Record>(&self, current: &Stored<R>, updated: &R) -> Result<bool, Error> {
        let value = Self::encode(updated)?;
        let swapped = self.tree(R::KIND).compare_and_swap(
            current.record.id().as_bytes(),
            Some(current.raw.as_ref()),
            Some(value),
        )?;
        Ok(swapped.is_ok())
    }

    /// Remove `current` if it is still stored unchanged.
    pub fn remove_stored<R: Record>(&self, current: &Stored<R>) -> Result<bool, Error> {
        let swapped = self.tree(R::KIND).compare_and_swap(
            current.record.id().as_bytes(),
            Some(current.raw.as_ref()),
            None as Option<&[u8]>,
        )?;
        Ok(swapped.is_ok())
    }

    /// Load every record of a collection, in key order.
    pub fn scan<R: Record>(&self) -> Result<Vec<R>, Error> {
        let mut records = Vec::new();
        for result in self.tree(R::KIND).iter() {
            let (_, value) = result?;
            records.push(Self::decode(&value)?);
        }
        Ok(records)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Generate a new record id.
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn encode<R: Record>(record: &R) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(record).map_err(|e| Error::Serialization(e.to_string()))
    }

    fn decode<R: Record>(bytes: &[u8]) -> Result<R, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, Property, PropertyKind, Role};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn listing(id: &str, city: &str) -> Property {
        let mut p = Property::new(city, PropertyKind::Sale, 320_000.0);
        p.id = id.to_string();
        p
    }

    #[test]
    fn test_insert_get_remove() {
        let store = RecordStore::temporary().unwrap();
        assert!(store.insert_new(&listing("p1", "Itajubá")).unwrap());

        let loaded: Property = store.get("p1").unwrap().unwrap();
        assert_eq!(loaded.city, "Itajubá");
        assert_eq!(store.scan::<Property>().unwrap().len(), 1);

        let stored = store.fetch::<Property>("p1").unwrap().unwrap();
        assert!(store.remove_stored(&stored).unwrap());
        assert!(!store.remove_stored(&stored).unwrap());
        assert!(store.get::<Property>("p1").unwrap().is_none());
    }

    #[test]
    fn test_collections_are_separate() {
        let store = RecordStore::temporary().unwrap();
        store.insert_new(&listing("same", "Pouso Alegre")).unwrap();
        store.insert_new(&Account::new("same", "a@b.c", Role::Client)).unwrap();

        assert!(store.get::<Property>("same").unwrap().is_some());
        assert!(store.get::<Account>("same").unwrap().is_some());
        assert_eq!(store.scan::<Account>().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_id_rejected() {
        let store = RecordStore::temporary().unwrap();
        let err = store.insert_new(&listing("", "Itajubá")).unwrap_err();
        assert!(matches!(err, Error::MissingId));
    }

    #[test]
    fn test_insert_new_conflict() {
        let store = RecordStore::temporary().unwrap();
        let account = Account::new("u1", "a@b.c", Role::Client);
        assert!(store.insert_new(&account).unwrap());
        assert!(!store.insert_new(&account).unwrap());
    }

    #[test]
    fn test_insert_first_only_once() {
        let store = RecordStore::temporary().unwrap();
        let first = Account::new("a", "a@b.c", Role::Admin);
        let second = Account::new("b", "b@b.c", Role::Admin);
        assert_eq!(store.insert_first(&first).unwrap(), Insertion::Inserted);
        assert_eq!(store.insert_first(&second).unwrap(), Insertion::NotFirst);

        // Emptying the collection does not reopen it.
        let stored = store.fetch::<Account>("a").unwrap().unwrap();
        assert!(store.remove_stored(&stored).unwrap());
        assert_eq!(store.insert_first(&second).unwrap(), Insertion::NotFirst);
        assert!(store.scan::<Account>().unwrap().is_empty());
    }

    #[test]
    fn test_insert_first_after_ordinary_insert() {
        let store = RecordStore::temporary().unwrap();
        store.insert_new(&Account::new("c", "c@b.c", Role::Client)).unwrap();
        let admin = Account::new("a", "a@b.c", Role::Admin);
        assert_eq!(store.insert_first(&admin).unwrap(), Insertion::NotFirst);
    }

    #[test]
    fn test_insert_first_concurrent() {
        for _ in 0..100 {
            let store = Arc::new(RecordStore::temporary().unwrap());
            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = ["a", "b"]
                .into_iter()
                .map(|uid| {
                    let store = store.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        let account = Account::new(uid, "x@b.c", Role::Admin);
                        barrier.wait();
                        store.insert_first(&account).unwrap()
                    })
                })
                .collect();
            let inserted = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|o| *o == Insertion::Inserted)
                .count();
            assert_eq!(inserted, 1);
            assert_eq!(store.scan::<Account>().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_replace_requires_unchanged_record() {
        let store = RecordStore::temporary().unwrap();
        store.insert_new(&listing("p1", "Itajubá")).unwrap();
        let stale = store.fetch::<Property>("p1").unwrap().unwrap();

        let fresh = store.fetch::<Property>("p1").unwrap().unwrap();
        let mut edit = fresh.record.clone();
        edit.price = 1.0;
        assert!(store.replace(&fresh, &edit).unwrap());

        let mut late = stale.record.clone();
        late.price = 2.0;
        assert!(!store.replace(&stale, &late).unwrap());
        assert!(!store.remove_stored(&stale).unwrap());
        assert_eq!(store.get::<Property>("p1").unwrap().unwrap().price, 1.0);
    }

    #[test]
    fn test_replace_after_remove_does_not_recreate() {
        let store = RecordStore::temporary().unwrap();
        store.insert_new(&listing("p1", "Itajubá")).unwrap();
        let checked = store.fetch::<Property>("p1").unwrap().unwrap();

        let other = store.fetch::<Property>("p1").unwrap().unwrap();
        assert!(store.remove_stored(&other).unwrap());
        assert!(!store.replace(&checked, &checked.record).unwrap());
        assert!(store.get::<Property>("p1").unwrap().is_none());
    }

    #[test]
    fn test_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = RecordStore::open(StorageConfig::new(dir.path())).unwrap();
            store.insert_new(&listing("p1", "Itajubá")).unwrap();
            store.insert_new(&Account::new("a", "a@b.c", Role::Admin)).unwrap();
            store.flush().unwrap();
        }
        let store = RecordStore::open(StorageConfig::new(dir.path())).unwrap();
        assert!(store.get::<Property>("p1").unwrap().is_some());
        let late = Account::new("b", "b@b.c", Role::Admin);
        assert_eq!(store.insert_first(&late).unwrap(), Insertion::NotFirst);
    }

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(RecordStore::generate_id(), RecordStore::generate_id());
    }
}
