//! Synchronization compilers.
//!
//! One compiler per repository operation, each translating between the
//! local store and the remote service. Compilers perform raw local writes
//! and remote calls; the repository wraps every run in a rollback scope and
//! emits the buffered audit events only after the scope commits.

use crate::audit::{AuditCause, AuditEvent};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::local::{LocalRecord, LocalStore};
use chrono::Utc;
use remstore_codec::{EntityMapping, Value};
use remstore_query::{render_filter, render_order_by, OrderBy, Predicate};
use remstore_remote::{Document, ListQuery, RemoteStore};
use std::collections::BTreeMap;
use tracing::debug;

/// Merges one remote document into the local store.
///
/// The candidate local row is located by remote id; when none exists a new
/// row is created, carrying the placeholder modification time so the remote
/// document always wins the comparison. An in-sync pair performs zero local
/// writes.
pub(crate) struct RefreshCompiler<'a> {
    pub mapping: &'a EntityMapping,
    pub local: &'a LocalStore,
    pub config: &'a EngineConfig,
}

impl RefreshCompiler<'_> {
    pub fn run(
        &self,
        doc: &Document,
        audit: &mut Vec<AuditEvent>,
    ) -> EngineResult<LocalRecord> {
        let entity = self.mapping.entity();
        let remote_id = self.mapping.remote_id_of(doc)?;

        match self.local.find_by_remote_id(entity, &remote_id) {
            Some(existing) => {
                let (delta, remote_modified, _) =
                    self.mapping.has_changed(existing.modified_at, doc)?;
                if delta == 0 {
                    return Ok(existing);
                }

                debug!(entity, remote_id = %remote_id, delta, "merging newer remote state");
                let mut attrs = existing.attrs.clone();
                attrs.extend(self.mapping.from_remote(doc)?);
                self.local.write_attrs(entity, existing.id, attrs);
                self.local
                    .write_sync_meta(entity, existing.id, &remote_id, remote_modified, None);

                let after = self.fetch(existing.id)?;
                audit.push(AuditEvent {
                    entity: entity.to_string(),
                    local_id: existing.id,
                    cause: AuditCause::Reconciliation,
                    before: Some(existing),
                    after: Some(after.clone()),
                });
                Ok(after)
            }
            None => {
                let (_, remote_modified, remote_created) = self
                    .mapping
                    .has_changed(self.config.ancient_timestamp, doc)?;

                debug!(entity, remote_id = %remote_id, "adopting remote record locally");
                let attrs = self.mapping.from_remote(doc)?;
                let record = self.local.insert(
                    entity,
                    remote_id,
                    remote_created,
                    remote_modified,
                    attrs,
                );
                audit.push(AuditEvent {
                    entity: entity.to_string(),
                    local_id: record.id,
                    cause: AuditCause::Reconciliation,
                    before: None,
                    after: Some(record.clone()),
                });
                Ok(record)
            }
        }
    }

    /// Fetches the document by remote id, then merges it.
    pub fn run_by_remote_id(
        &self,
        remote: &dyn RemoteStore,
        remote_id: &str,
        audit: &mut Vec<AuditEvent>,
    ) -> EngineResult<LocalRecord> {
        debug!(entity = self.mapping.entity(), remote_id, "point refresh");
        let doc = remote.get(self.mapping.service(), remote_id)?;
        self.run(&doc, audit)
    }

    fn fetch(&self, id: u64) -> EngineResult<LocalRecord> {
        self.local
            .get(self.mapping.entity(), id)
            .ok_or_else(|| EngineError::record_not_found(self.mapping.entity(), id))
    }
}

/// Runs a filtered, ordered remote list and reconciles every returned
/// document. Records come back in the remote service's sort order.
pub(crate) struct SelectCompiler<'a> {
    pub mapping: &'a EntityMapping,
    pub local: &'a LocalStore,
    pub remote: &'a dyn RemoteStore,
    pub config: &'a EngineConfig,
}

impl SelectCompiler<'_> {
    pub fn run(
        &self,
        predicate: &Predicate,
        ordering: &[OrderBy],
        top: Option<u32>,
        skip: Option<u32>,
        audit: &mut Vec<AuditEvent>,
    ) -> EngineResult<Vec<LocalRecord>> {
        // Translation failures surface here, before the remote is reached.
        let filter = render_filter(predicate, self.mapping)?;
        let order_by = render_order_by(ordering, self.mapping)?;

        let mut query = ListQuery::new().with_order_by(order_by);
        if let Some(filter) = filter {
            query = query.with_filter(filter);
        }
        if let Some(top) = top {
            query = query.with_top(top);
        }
        if let Some(skip) = skip {
            query = query.with_skip(skip);
        }

        debug!(
            entity = self.mapping.entity(),
            filter = query.filter.as_deref().unwrap_or(""),
            "listing remote records"
        );
        let docs = self.remote.list(self.mapping.service(), &query)?;

        let refresh = RefreshCompiler {
            mapping: self.mapping,
            local: self.local,
            config: self.config,
        };
        docs.iter().map(|doc| refresh.run(doc, audit)).collect()
    }
}

/// Creates a record locally, then remotely, then backfills the assigned
/// remote id and modification time.
pub(crate) struct InsertCompiler<'a> {
    pub mapping: &'a EntityMapping,
    pub local: &'a LocalStore,
    pub remote: &'a dyn RemoteStore,
}

impl InsertCompiler<'_> {
    pub fn run(
        &self,
        attrs: BTreeMap<String, Value>,
        audit: &mut Vec<AuditEvent>,
    ) -> EngineResult<LocalRecord> {
        let entity = self.mapping.entity();
        let now = Utc::now();
        let record = self.local.insert(entity, String::new(), now, now, attrs);

        let mut doc = self.mapping.to_remote(&record.attrs)?;
        self.mapping.strip_server_fields(&mut doc);

        debug!(entity, local_id = record.id, "creating remote record");
        let created = self.remote.create(self.mapping.service(), doc)?;

        let remote_id = self.mapping.remote_id_of(&created)?;
        let modified = self.mapping.modified_on(&created)?;
        self.local
            .write_sync_meta(entity, record.id, &remote_id, modified, None);

        let after = self
            .local
            .get(entity, record.id)
            .ok_or_else(|| EngineError::record_not_found(entity, record.id))?;
        audit.push(AuditEvent {
            entity: entity.to_string(),
            local_id: record.id,
            cause: AuditCause::Application,
            before: None,
            after: Some(after.clone()),
        });
        Ok(after)
    }
}

/// Applies attribute changes to one record, remote-first with
/// whole-resource semantics: the current remote document is fetched, the
/// changed fields overlaid, and the result sent back.
pub(crate) struct UpdateCompiler<'a> {
    pub mapping: &'a EntityMapping,
    pub local: &'a LocalStore,
    pub remote: &'a dyn RemoteStore,
}

impl UpdateCompiler<'_> {
    pub fn run(
        &self,
        local_id: u64,
        changes: BTreeMap<String, Value>,
        audit: &mut Vec<AuditEvent>,
    ) -> EngineResult<LocalRecord> {
        let entity = self.mapping.entity();
        let row = self
            .local
            .get(entity, local_id)
            .ok_or_else(|| EngineError::record_not_found(entity, local_id))?;
        if !row.has_remote_id() {
            return Err(EngineError::missing_remote_id(entity, local_id));
        }

        let mut attrs = row.attrs.clone();
        attrs.extend(changes.clone());
        self.local.write_attrs(entity, local_id, attrs);

        debug!(entity, local_id, remote_id = %row.remote_id, "updating remote record");
        let mut doc = self.remote.get(self.mapping.service(), &row.remote_id)?;
        doc.extend(self.mapping.to_remote(&changes)?);
        self.mapping.strip_server_fields(&mut doc);
        let updated = self
            .remote
            .update(self.mapping.service(), &row.remote_id, doc)?;

        let modified = self.mapping.modified_on(&updated)?;
        self.local
            .write_sync_meta(entity, local_id, &row.remote_id, modified, None);

        let after = self
            .local
            .get(entity, local_id)
            .ok_or_else(|| EngineError::record_not_found(entity, local_id))?;
        audit.push(AuditEvent {
            entity: entity.to_string(),
            local_id,
            cause: AuditCause::Application,
            before: Some(row),
            after: Some(after.clone()),
        });
        Ok(after)
    }
}

/// Deletes a record, remote store first. The local row is only removed
/// once the remote delete succeeds.
pub(crate) struct DeleteCompiler<'a> {
    pub mapping: &'a EntityMapping,
    pub local: &'a LocalStore,
    pub remote: &'a dyn RemoteStore,
}

impl DeleteCompiler<'_> {
    pub fn run(&self, local_id: u64, audit: &mut Vec<AuditEvent>) -> EngineResult<()> {
        let entity = self.mapping.entity();
        let row = self
            .local
            .get(entity, local_id)
            .ok_or_else(|| EngineError::record_not_found(entity, local_id))?;
        if !row.has_remote_id() {
            return Err(EngineError::missing_remote_id(entity, local_id));
        }

        debug!(entity, local_id, remote_id = %row.remote_id, "deleting remote record");
        self.remote.delete(self.mapping.service(), &row.remote_id)?;
        self.local.delete(entity, local_id);

        audit.push(AuditEvent {
            entity: entity.to_string(),
            local_id,
            cause: AuditCause::Application,
            before: Some(row),
            after: None,
        });
        Ok(())
    }
}
