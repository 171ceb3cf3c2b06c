//! An in-memory stand-in for the remote entity service.

use crate::error::{RemoteError, RemoteResult};
use crate::query::ListQuery;
use crate::store::RemoteStore;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use remstore_codec::{format_wire_timestamp, Document};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// An in-memory fake of the remote entity service.
///
/// Keeps documents per service name, mints uuid remote ids and wire-format
/// `CreatedOn`/`ModifiedOn` stamps. A logical clock starts at a fixed
/// instant and advances one second per mutation, so test runs are
/// deterministic.
///
/// `top` and `skip` are applied; filter strings and order-by clauses are
/// accepted but not interpreted — tests that depend on filtering seed
/// exactly the documents they expect back.
pub struct MemoryRemote {
    state: Mutex<State>,
}

struct State {
    services: HashMap<String, Vec<Document>>,
    now: DateTime<Utc>,
}

impl MemoryRemote {
    /// Creates an empty fake service.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                services: HashMap::new(),
                now: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            }),
        }
    }

    /// Seeds a document as-is, without touching ids or timestamps.
    pub fn seed(&self, service: &str, doc: Document) {
        self.state
            .lock()
            .services
            .entry(service.to_string())
            .or_default()
            .push(doc);
    }

    /// Moves the logical clock forward.
    pub fn advance_clock(&self, seconds: i64) {
        self.state.lock().now += Duration::seconds(seconds);
    }

    /// The current logical clock value.
    pub fn now(&self) -> DateTime<Utc> {
        self.state.lock().now
    }

    /// Number of documents currently held for a service.
    pub fn count(&self, service: &str) -> usize {
        self.state
            .lock()
            .services
            .get(service)
            .map_or(0, Vec::len)
    }

    fn id_field(service: &str) -> String {
        format!("{service}Id")
    }

    fn position(state: &State, service: &str, remote_id: &str) -> Option<usize> {
        let id_field = Self::id_field(service);
        state.services.get(service)?.iter().position(|doc| {
            doc.get(&id_field).and_then(|v| v.as_str()) == Some(remote_id)
        })
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for MemoryRemote {
    fn list(&self, service: &str, query: &ListQuery) -> RemoteResult<Vec<Document>> {
        let state = self.state.lock();
        let docs = state.services.get(service).cloned().unwrap_or_default();

        let skip = query.skip.unwrap_or(0) as usize;
        let top = query.top.map_or(usize::MAX, |t| t as usize);
        Ok(docs.into_iter().skip(skip).take(top).collect())
    }

    fn get(&self, service: &str, remote_id: &str) -> RemoteResult<Document> {
        let state = self.state.lock();
        let pos = Self::position(&state, service, remote_id)
            .ok_or_else(|| RemoteError::not_found(service, remote_id))?;
        Ok(state.services[service][pos].clone())
    }

    fn create(&self, service: &str, mut data: Document) -> RemoteResult<Document> {
        let mut state = self.state.lock();
        let stamp = json!(format_wire_timestamp(state.now));
        state.now += Duration::seconds(1);

        data.insert(Self::id_field(service), json!(Uuid::new_v4().to_string()));
        data.insert("CreatedOn".to_string(), stamp.clone());
        data.insert("ModifiedOn".to_string(), stamp);

        state
            .services
            .entry(service.to_string())
            .or_default()
            .push(data.clone());
        Ok(data)
    }

    fn update(
        &self,
        service: &str,
        remote_id: &str,
        data: Document,
    ) -> RemoteResult<Document> {
        let mut state = self.state.lock();
        let pos = Self::position(&state, service, remote_id)
            .ok_or_else(|| RemoteError::not_found(service, remote_id))?;

        let stamp = json!(format_wire_timestamp(state.now));
        state.now += Duration::seconds(1);

        let doc = state
            .services
            .get_mut(service)
            .and_then(|docs| docs.get_mut(pos))
            .ok_or_else(|| RemoteError::not_found(service, remote_id))?;
        doc.extend(data);
        doc.insert("ModifiedOn".to_string(), stamp);
        Ok(doc.clone())
    }

    fn delete(&self, service: &str, remote_id: &str) -> RemoteResult<()> {
        let mut state = self.state.lock();
        let pos = Self::position(&state, service, remote_id)
            .ok_or_else(|| RemoteError::not_found(service, remote_id))?;
        if let Some(docs) = state.services.get_mut(service) {
            docs.remove(pos);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_id_and_stamps() {
        let remote = MemoryRemote::new();
        let mut data = Document::new();
        data.insert("Name".into(), json!("Acme"));

        let created = remote.create("Account", data).unwrap();
        assert!(created.get("AccountId").and_then(|v| v.as_str()).is_some());
        assert_eq!(created.get("CreatedOn"), created.get("ModifiedOn"));
        assert_eq!(remote.count("Account"), 1);
    }

    #[test]
    fn update_advances_modified_on_only() {
        let remote = MemoryRemote::new();
        let created = remote.create("Account", Document::new()).unwrap();
        let id = created["AccountId"].as_str().unwrap().to_string();

        let mut changes = Document::new();
        changes.insert("Name".into(), json!("Acme Ltd"));
        let updated = remote.update("Account", &id, changes).unwrap();

        assert_eq!(updated.get("CreatedOn"), created.get("CreatedOn"));
        assert_ne!(updated.get("ModifiedOn"), created.get("ModifiedOn"));
        assert_eq!(updated["Name"], json!("Acme Ltd"));
    }

    #[test]
    fn get_and_delete_by_remote_id() {
        let remote = MemoryRemote::new();
        let created = remote.create("Account", Document::new()).unwrap();
        let id = created["AccountId"].as_str().unwrap().to_string();

        assert!(remote.get("Account", &id).is_ok());
        remote.delete("Account", &id).unwrap();
        assert!(remote.get("Account", &id).unwrap_err().is_not_found());
        assert_eq!(remote.count("Account"), 0);
    }

    #[test]
    fn list_applies_top_and_skip() {
        let remote = MemoryRemote::new();
        for _ in 0..5 {
            remote.create("Account", Document::new()).unwrap();
        }

        let page = remote
            .list("Account", &ListQuery::new().with_skip(1).with_top(2))
            .unwrap();
        assert_eq!(page.len(), 2);
    }
}
