//! The local relational store.
//!
//! Rows live in per-entity-type tables behind one lock. Mutations normally
//! run inside a [`LocalStore::transaction`] scope: the scope snapshots every
//! table and restores the snapshot when the closure fails, so a failed
//! remote call never leaves partial local state behind.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use remstore_codec::Value;
use std::collections::{BTreeMap, HashMap};

/// One row of the local store.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRecord {
    /// Local primary key, assigned by the store.
    pub id: u64,
    /// The remote service's id for this record. Blank until the record has
    /// been written through to the remote store.
    pub remote_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Modification time. After a reconciling fetch or confirmed remote
    /// write this equals the remote `ModifiedOn`, never a local clock read.
    pub modified_at: DateTime<Utc>,
    /// Attribute values, keyed by local attribute name.
    pub attrs: BTreeMap<String, Value>,
}

impl LocalRecord {
    /// Returns true if this record has been written through to the remote
    /// store.
    pub fn has_remote_id(&self) -> bool {
        !self.remote_id.is_empty()
    }

    /// Returns an attribute value, with `modified_at` and `created_at`
    /// addressable like mapped attributes.
    pub fn attr(&self, name: &str) -> Value {
        match name {
            "modified_at" => Value::Timestamp(self.modified_at),
            "created_at" => Value::Timestamp(self.created_at),
            _ => self.attrs.get(name).cloned().unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Table {
    next_id: u64,
    rows: BTreeMap<u64, LocalRecord>,
}

/// Per-entity-type tables of [`LocalRecord`] rows.
#[derive(Debug, Default)]
pub struct LocalStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl LocalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row, assigning the next local id.
    pub fn insert(
        &self,
        entity: &str,
        remote_id: String,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
        attrs: BTreeMap<String, Value>,
    ) -> LocalRecord {
        let mut tables = self.tables.write();
        let table = tables.entry(entity.to_string()).or_default();
        table.next_id += 1;
        let record = LocalRecord {
            id: table.next_id,
            remote_id,
            created_at,
            modified_at,
            attrs,
        };
        table.rows.insert(record.id, record.clone());
        record
    }

    /// Fetches a row by local id.
    pub fn get(&self, entity: &str, id: u64) -> Option<LocalRecord> {
        self.tables.read().get(entity)?.rows.get(&id).cloned()
    }

    /// Fetches the row holding a remote id, if any.
    pub fn find_by_remote_id(&self, entity: &str, remote_id: &str) -> Option<LocalRecord> {
        self.tables
            .read()
            .get(entity)?
            .rows
            .values()
            .find(|row| row.remote_id == remote_id)
            .cloned()
    }

    /// Overwrites a row's attribute values. Returns false if the row does
    /// not exist.
    pub fn write_attrs(
        &self,
        entity: &str,
        id: u64,
        attrs: BTreeMap<String, Value>,
    ) -> bool {
        let mut tables = self.tables.write();
        match tables.get_mut(entity).and_then(|t| t.rows.get_mut(&id)) {
            Some(row) => {
                row.attrs = attrs;
                true
            }
            None => false,
        }
    }

    /// Writes a row's synchronization bookkeeping: remote id, modification
    /// time and, when given, the remote creation time. Kept separate from
    /// [`Self::write_attrs`] so attribute merges and protocol bookkeeping
    /// are distinct writes.
    pub fn write_sync_meta(
        &self,
        entity: &str,
        id: u64,
        remote_id: &str,
        modified_at: DateTime<Utc>,
        created_at: Option<DateTime<Utc>>,
    ) -> bool {
        let mut tables = self.tables.write();
        match tables.get_mut(entity).and_then(|t| t.rows.get_mut(&id)) {
            Some(row) => {
                row.remote_id = remote_id.to_string();
                row.modified_at = modified_at;
                if let Some(created) = created_at {
                    row.created_at = created;
                }
                true
            }
            None => false,
        }
    }

    /// Removes a row, returning it.
    pub fn delete(&self, entity: &str, id: u64) -> Option<LocalRecord> {
        self.tables.write().get_mut(entity)?.rows.remove(&id)
    }

    /// All rows of an entity type, in local-id order.
    pub fn all(&self, entity: &str) -> Vec<LocalRecord> {
        self.tables
            .read()
            .get(entity)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of rows of an entity type.
    pub fn len(&self, entity: &str) -> usize {
        self.tables.read().get(entity).map_or(0, |t| t.rows.len())
    }

    /// Returns true if the entity type has no rows.
    pub fn is_empty(&self, entity: &str) -> bool {
        self.len(entity) == 0
    }

    /// Runs a closure in a rollback scope.
    ///
    /// The table state is snapshotted before the closure runs; if the
    /// closure fails the snapshot is restored, undoing every write the
    /// closure made through this store.
    pub fn transaction<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let snapshot = self.tables.read().clone();
        match f() {
            Ok(value) => Ok(value),
            Err(err) => {
                *self.tables.write() = snapshot;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use remstore_codec::Value;

    fn stamp(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, min, 0).unwrap()
    }

    fn attrs(name: &str) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::Text(name.into()));
        map
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let store = LocalStore::new();
        let a = store.insert("organisation", String::new(), stamp(0), stamp(0), attrs("a"));
        let b = store.insert("organisation", String::new(), stamp(0), stamp(0), attrs("b"));
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len("organisation"), 2);
    }

    #[test]
    fn tables_are_independent_per_entity() {
        let store = LocalStore::new();
        let org = store.insert("organisation", String::new(), stamp(0), stamp(0), attrs("a"));
        let contact = store.insert("contact", String::new(), stamp(0), stamp(0), attrs("b"));
        assert_eq!(org.id, 1);
        assert_eq!(contact.id, 1);
        assert_eq!(store.len("organisation"), 1);
        assert_eq!(store.len("contact"), 1);
    }

    #[test]
    fn find_by_remote_id() {
        let store = LocalStore::new();
        store.insert("organisation", "a-1".into(), stamp(0), stamp(0), attrs("a"));
        store.insert("organisation", String::new(), stamp(0), stamp(0), attrs("b"));

        let found = store.find_by_remote_id("organisation", "a-1").unwrap();
        assert_eq!(found.attr("name"), Value::Text("a".into()));
        assert!(store.find_by_remote_id("organisation", "a-2").is_none());
    }

    #[test]
    fn sync_meta_write_is_scoped() {
        let store = LocalStore::new();
        let row = store.insert("organisation", String::new(), stamp(0), stamp(0), attrs("a"));

        assert!(store.write_sync_meta("organisation", row.id, "a-1", stamp(5), None));
        let row = store.get("organisation", row.id).unwrap();
        assert_eq!(row.remote_id, "a-1");
        assert_eq!(row.modified_at, stamp(5));
        assert_eq!(row.created_at, stamp(0));
        assert_eq!(row.attr("name"), Value::Text("a".into()));
    }

    #[test]
    fn failed_transaction_rolls_back_all_writes() {
        let store = LocalStore::new();
        let kept = store.insert("organisation", String::new(), stamp(0), stamp(0), attrs("kept"));

        let result: Result<(), &str> = store.transaction(|| {
            store.insert("organisation", String::new(), stamp(1), stamp(1), attrs("doomed"));
            store.write_attrs("organisation", kept.id, attrs("mutated"));
            store.delete("organisation", kept.id);
            Err("remote call failed")
        });

        assert!(result.is_err());
        assert_eq!(store.len("organisation"), 1);
        let row = store.get("organisation", kept.id).unwrap();
        assert_eq!(row.attr("name"), Value::Text("kept".into()));
    }

    #[test]
    fn successful_transaction_keeps_writes() {
        let store = LocalStore::new();
        let result: Result<u64, &str> = store.transaction(|| {
            let row = store.insert("organisation", String::new(), stamp(0), stamp(0), attrs("a"));
            Ok(row.id)
        });
        assert_eq!(store.get("organisation", result.unwrap()).unwrap().id, 1);
    }

    #[test]
    fn record_attr_addresses_timestamps() {
        let store = LocalStore::new();
        let row = store.insert("organisation", String::new(), stamp(1), stamp(2), attrs("a"));
        assert_eq!(row.attr("created_at"), Value::Timestamp(stamp(1)));
        assert_eq!(row.attr("modified_at"), Value::Timestamp(stamp(2)));
        assert_eq!(row.attr("missing"), Value::Null);
    }
}
