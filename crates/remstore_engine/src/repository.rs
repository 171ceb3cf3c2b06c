//! The repository facade.

use crate::audit::{AuditCause, AuditEvent, AuditSink};
use crate::compiler::{
    DeleteCompiler, InsertCompiler, RefreshCompiler, SelectCompiler, UpdateCompiler,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::local::{LocalRecord, LocalStore};
use chrono::{Datelike, Timelike, Utc};
use parking_lot::Mutex;
use remstore_codec::{EntityMapping, MappingRegistry, Value};
use remstore_query::{
    attr, render_filter, render_order_by, Comparison, Condition, Direction, OrderBy,
    Predicate,
};
use remstore_remote::RemoteStore;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

/// Warmed related records, keyed by `(entity, remote_id)`. Shared between
/// repository handles created from one another so a batch lookup can
/// pre-resolve references for its results.
type WarmCache = Arc<Mutex<HashMap<(String, String), LocalRecord>>>;

/// Entry point for all reads and writes of one entity type.
///
/// Every returned record reflects reconciled state: bulk and point lookups
/// fetch from the remote store and merge newer remote state into the local
/// store before returning. Writes go to the remote store first and commit
/// locally only when the remote confirms; a failed remote call rolls every
/// local effect back.
///
/// [`Repository::local_only`] yields a handle that skips the remote store
/// entirely while keeping transaction semantics and audit events.
pub struct Repository {
    mapping: Arc<EntityMapping>,
    registry: Arc<MappingRegistry>,
    local: Arc<LocalStore>,
    remote: Arc<dyn RemoteStore>,
    audit: Arc<dyn AuditSink>,
    config: EngineConfig,
    remote_enabled: bool,
    warm: WarmCache,
}

impl Repository {
    /// Creates a repository for one entity type.
    ///
    /// Fails if the entity is not in the mapping registry.
    pub fn new(
        entity: &str,
        registry: Arc<MappingRegistry>,
        local: Arc<LocalStore>,
        remote: Arc<dyn RemoteStore>,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        let mapping = registry.get(entity)?;
        Ok(Self {
            mapping,
            registry,
            local,
            remote,
            audit,
            config,
            remote_enabled: true,
            warm: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// The entity type this repository serves.
    pub fn entity(&self) -> &str {
        self.mapping.entity()
    }

    /// Returns true if this handle skips the remote store.
    pub fn is_local_only(&self) -> bool {
        !self.remote_enabled
    }

    /// A handle over the same stores whose operations never reach the
    /// remote service. Writes stay transactional and audited.
    pub fn local_only(&self) -> Self {
        Self {
            mapping: Arc::clone(&self.mapping),
            registry: Arc::clone(&self.registry),
            local: Arc::clone(&self.local),
            remote: Arc::clone(&self.remote),
            audit: Arc::clone(&self.audit),
            config: self.config.clone(),
            remote_enabled: false,
            warm: Arc::clone(&self.warm),
        }
    }

    /// A repository for another entity type, sharing this handle's stores,
    /// mode and warmed-reference cache.
    pub fn for_entity(&self, entity: &str) -> EngineResult<Self> {
        Ok(Self {
            mapping: self.registry.get(entity)?,
            registry: Arc::clone(&self.registry),
            local: Arc::clone(&self.local),
            remote: Arc::clone(&self.remote),
            audit: Arc::clone(&self.audit),
            config: self.config.clone(),
            remote_enabled: self.remote_enabled,
            warm: Arc::clone(&self.warm),
        })
    }

    // ---- reads ----

    /// Finds all records matching a predicate, in the default order.
    pub fn find(&self, predicate: &Predicate) -> EngineResult<Vec<LocalRecord>> {
        self.find_page(predicate, &[], None, None)
    }

    /// Finds all records matching a predicate, in an explicit order.
    pub fn find_ordered(
        &self,
        predicate: &Predicate,
        ordering: &[OrderBy],
    ) -> EngineResult<Vec<LocalRecord>> {
        self.find_page(predicate, ordering, None, None)
    }

    /// Finds one page of matching records.
    ///
    /// `top` and `skip` are pushed down to the remote store; no implicit
    /// pagination happens on top of them. An empty `ordering` falls back to
    /// the configured default order, with a warning, because an unordered
    /// bulk select reconciles in unspecified order.
    pub fn find_page(
        &self,
        predicate: &Predicate,
        ordering: &[OrderBy],
        top: Option<u32>,
        skip: Option<u32>,
    ) -> EngineResult<Vec<LocalRecord>> {
        let ordering = self.effective_ordering(ordering);
        if self.remote_enabled {
            self.write_scope(|audit| {
                SelectCompiler {
                    mapping: &self.mapping,
                    local: &self.local,
                    remote: self.remote.as_ref(),
                    config: &self.config,
                }
                .run(predicate, &ordering, top, skip, audit)
            })
        } else {
            self.find_local(predicate, &ordering, top, skip)
        }
    }

    /// Finds the single record matching a predicate.
    pub fn get(&self, predicate: &Predicate) -> EngineResult<LocalRecord> {
        let mut records = self.find(predicate)?;
        match records.len() {
            1 => Ok(records.remove(0)),
            0 => Err(EngineError::NoMatch {
                entity: self.entity().to_string(),
            }),
            count => Err(EngineError::MultipleMatches {
                entity: self.entity().to_string(),
                count,
            }),
        }
    }

    /// Fetches a record by its remote id.
    ///
    /// Looks locally first; when the id is locally unknown and the remote
    /// store is enabled, falls back to a point refresh that adopts the
    /// remote record.
    pub fn get_by_remote_id(&self, remote_id: &str) -> EngineResult<LocalRecord> {
        if let Some(row) = self.local.find_by_remote_id(self.entity(), remote_id) {
            return Ok(row);
        }
        if !self.remote_enabled {
            return Err(EngineError::unknown_remote_id(self.entity(), remote_id));
        }

        let result = self.write_scope(|audit| {
            RefreshCompiler {
                mapping: &self.mapping,
                local: &self.local,
                config: &self.config,
            }
            .run_by_remote_id(self.remote.as_ref(), remote_id, audit)
        });
        match result {
            Err(EngineError::Remote(err)) if err.is_not_found() => {
                Err(EngineError::unknown_remote_id(self.entity(), remote_id))
            }
            other => other,
        }
    }

    /// Re-reconciles one record against the remote store.
    pub fn refresh(&self, local_id: u64) -> EngineResult<LocalRecord> {
        if !self.remote_enabled {
            return Err(EngineError::unsupported(
                "refresh requires the remote store",
            ));
        }
        let row = self.fetch(local_id)?;
        if !row.has_remote_id() {
            return Err(EngineError::missing_remote_id(self.entity(), local_id));
        }
        self.write_scope(|audit| {
            RefreshCompiler {
                mapping: &self.mapping,
                local: &self.local,
                config: &self.config,
            }
            .run_by_remote_id(self.remote.as_ref(), &row.remote_id, audit)
        })
    }

    // ---- writes ----

    /// Creates a record from attribute values.
    pub fn create(&self, attrs: BTreeMap<String, Value>) -> EngineResult<LocalRecord> {
        self.write_scope(|audit| {
            if self.remote_enabled {
                InsertCompiler {
                    mapping: &self.mapping,
                    local: &self.local,
                    remote: self.remote.as_ref(),
                }
                .run(attrs, audit)
            } else {
                let now = Utc::now();
                let record = self.local.insert(self.entity(), String::new(), now, now, attrs);
                audit.push(AuditEvent {
                    entity: self.entity().to_string(),
                    local_id: record.id,
                    cause: AuditCause::Application,
                    before: None,
                    after: Some(record.clone()),
                });
                Ok(record)
            }
        })
    }

    /// Applies attribute changes to one record.
    pub fn update(
        &self,
        local_id: u64,
        changes: BTreeMap<String, Value>,
    ) -> EngineResult<LocalRecord> {
        self.write_scope(|audit| {
            if self.remote_enabled {
                UpdateCompiler {
                    mapping: &self.mapping,
                    local: &self.local,
                    remote: self.remote.as_ref(),
                }
                .run(local_id, changes, audit)
            } else {
                let row = self.fetch(local_id)?;
                let mut attrs = row.attrs.clone();
                attrs.extend(changes);
                self.local.write_attrs(self.entity(), local_id, attrs);
                self.local.write_sync_meta(
                    self.entity(),
                    local_id,
                    &row.remote_id,
                    Utc::now(),
                    None,
                );
                let after = self.fetch(local_id)?;
                audit.push(AuditEvent {
                    entity: self.entity().to_string(),
                    local_id,
                    cause: AuditCause::Application,
                    before: Some(row),
                    after: Some(after.clone()),
                });
                Ok(after)
            }
        })
    }

    /// Deletes one record.
    pub fn delete(&self, local_id: u64) -> EngineResult<()> {
        self.write_scope(|audit| {
            if self.remote_enabled {
                DeleteCompiler {
                    mapping: &self.mapping,
                    local: &self.local,
                    remote: self.remote.as_ref(),
                }
                .run(local_id, audit)
            } else {
                let row = self.fetch(local_id)?;
                self.local.delete(self.entity(), local_id);
                audit.push(AuditEvent {
                    entity: self.entity().to_string(),
                    local_id,
                    cause: AuditCause::Application,
                    before: Some(row),
                    after: None,
                });
                Ok(())
            }
        })
    }

    // ---- relationships ----

    /// Resolves a reference attribute to the record it points at.
    ///
    /// `Ok(None)` when the reference is null. A warmed record is returned
    /// without touching either store; otherwise the target is fetched by
    /// remote id, adopting it locally in remote mode.
    pub fn resolve_reference(
        &self,
        record: &LocalRecord,
        attr_name: &str,
    ) -> EngineResult<Option<LocalRecord>> {
        let field = self.mapping.remote_field(attr_name)?;
        let target = field
            .codec
            .reference_entity()
            .ok_or_else(|| {
                EngineError::unsupported(format!("{attr_name} is not a reference attribute"))
            })?
            .to_string();

        match record.attr(attr_name) {
            Value::Null => Ok(None),
            Value::Reference(remote_id) => {
                if let Some(hit) = self.warm.lock().get(&(target.clone(), remote_id.clone()))
                {
                    return Ok(Some(hit.clone()));
                }
                let related = self.for_entity(&target)?;
                related.get_by_remote_id(&remote_id).map(Some)
            }
            other => Err(EngineError::unsupported(format!(
                "{attr_name} holds a {} value, not a reference",
                other.kind()
            ))),
        }
    }

    /// Finds the records of `child_entity` whose `via_attr` reference
    /// points at `parent`. The parent is warmed so resolving that reference
    /// on the returned children is free.
    pub fn find_children(
        &self,
        child_entity: &str,
        via_attr: &str,
        parent: &LocalRecord,
    ) -> EngineResult<Vec<LocalRecord>> {
        if !parent.has_remote_id() {
            return Err(EngineError::missing_remote_id(self.entity(), parent.id));
        }
        self.warm.lock().insert(
            (self.entity().to_string(), parent.remote_id.clone()),
            parent.clone(),
        );
        let children = self.for_entity(child_entity)?;
        children.find(&attr(via_attr).eq(Value::Reference(parent.remote_id.clone())))
    }

    // ---- refused operations ----

    /// Bulk update across a predicate. Refused: the remote store has no
    /// multi-record write, so this could only degrade into unbounded
    /// record-at-a-time traffic.
    pub fn update_where(
        &self,
        _predicate: &Predicate,
        _changes: BTreeMap<String, Value>,
    ) -> EngineResult<usize> {
        Err(EngineError::unsupported(
            "bulk update across a predicate is not synchronized",
        ))
    }

    /// Bulk delete across a predicate. Refused, as [`Self::update_where`].
    pub fn delete_where(&self, _predicate: &Predicate) -> EngineResult<usize> {
        Err(EngineError::unsupported(
            "bulk delete across a predicate is not synchronized",
        ))
    }

    /// Attaching an existing child after creation. Refused: reparenting
    /// has no confirmed-write path through the remote service.
    pub fn attach_child(
        &self,
        _parent: &LocalRecord,
        _via_attr: &str,
        _child: &LocalRecord,
    ) -> EngineResult<()> {
        Err(EngineError::unsupported(
            "attaching an existing child is not synchronized",
        ))
    }

    /// Detaching a child. Refused, as [`Self::attach_child`].
    pub fn detach_child(
        &self,
        _parent: &LocalRecord,
        _via_attr: &str,
        _child: &LocalRecord,
    ) -> EngineResult<()> {
        Err(EngineError::unsupported(
            "detaching a child is not synchronized",
        ))
    }

    // ---- internals ----

    fn fetch(&self, local_id: u64) -> EngineResult<LocalRecord> {
        self.local
            .get(self.entity(), local_id)
            .ok_or_else(|| EngineError::record_not_found(self.entity(), local_id))
    }

    /// Runs a write in a rollback scope, emitting the buffered audit
    /// events only when the scope commits.
    fn write_scope<T>(
        &self,
        f: impl FnOnce(&mut Vec<AuditEvent>) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut events = Vec::new();
        let result = self.local.transaction(|| f(&mut events));
        if result.is_ok() {
            for event in events {
                self.audit.record(event);
            }
        }
        result
    }

    fn effective_ordering(&self, ordering: &[OrderBy]) -> Vec<OrderBy> {
        if ordering.is_empty() {
            warn!(
                entity = self.entity(),
                "bulk select without explicit ordering, falling back to the default order"
            );
            self.config.default_order.clone()
        } else {
            ordering.to_vec()
        }
    }

    /// Evaluates a find against the local store only.
    ///
    /// The predicate and ordering are still validated through the field
    /// mapping, so a query that the remote grammar would refuse fails
    /// identically in local mode.
    fn find_local(
        &self,
        predicate: &Predicate,
        ordering: &[OrderBy],
        top: Option<u32>,
        skip: Option<u32>,
    ) -> EngineResult<Vec<LocalRecord>> {
        render_filter(predicate, &self.mapping)?;
        render_order_by(ordering, &self.mapping)?;

        let mut records: Vec<LocalRecord> = self
            .local
            .all(self.entity())
            .into_iter()
            .filter(|record| predicate_matches(record, predicate))
            .collect();

        records.sort_by(|a, b| compare_ordered(a, b, ordering));

        let skip = skip.unwrap_or(0) as usize;
        let top = top.map_or(usize::MAX, |t| t as usize);
        Ok(records.into_iter().skip(skip).take(top).collect())
    }
}

fn predicate_matches(record: &LocalRecord, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Leaf(condition) => condition_matches(record, condition),
        Predicate::And(children) => {
            children.iter().all(|child| predicate_matches(record, child))
        }
        Predicate::Or(children) => {
            children.iter().any(|child| predicate_matches(record, child))
        }
        Predicate::Not(inner) => !predicate_matches(record, inner),
    }
}

fn condition_matches(record: &LocalRecord, condition: &Condition) -> bool {
    let actual = record.attr(&condition.attr);
    let expected = &condition.value;

    let texts = || Option::zip(actual.as_text(), expected.as_text());
    let ordered = |check: fn(Ordering) -> bool| {
        compare_values(&actual, expected).is_some_and(check)
    };
    let date_part = |part: fn(&chrono::DateTime<Utc>) -> i64| {
        Option::zip(actual.as_timestamp(), expected.as_integer())
            .is_some_and(|(ts, n)| part(&ts) == n)
    };

    match condition.op {
        Comparison::Exact => actual == *expected,
        Comparison::IExact => texts()
            .map(|(a, e)| a.eq_ignore_ascii_case(e))
            .unwrap_or(actual == *expected),
        Comparison::Lt => ordered(Ordering::is_lt),
        Comparison::Lte => ordered(Ordering::is_le),
        Comparison::Gt => ordered(Ordering::is_gt),
        Comparison::Gte => ordered(Ordering::is_ge),
        Comparison::Contains => texts().is_some_and(|(a, e)| a.contains(e)),
        Comparison::IContains => {
            texts().is_some_and(|(a, e)| a.to_lowercase().contains(&e.to_lowercase()))
        }
        Comparison::StartsWith => texts().is_some_and(|(a, e)| a.starts_with(e)),
        Comparison::IStartsWith => {
            texts().is_some_and(|(a, e)| a.to_lowercase().starts_with(&e.to_lowercase()))
        }
        Comparison::EndsWith => texts().is_some_and(|(a, e)| a.ends_with(e)),
        Comparison::IEndsWith => {
            texts().is_some_and(|(a, e)| a.to_lowercase().ends_with(&e.to_lowercase()))
        }
        Comparison::Year => date_part(|ts| i64::from(ts.year())),
        Comparison::Month => date_part(|ts| i64::from(ts.month())),
        Comparison::Day => date_part(|ts| i64::from(ts.day())),
        Comparison::Hour => date_part(|ts| i64::from(ts.hour())),
        Comparison::Minute => date_part(|ts| i64::from(ts.minute())),
        Comparison::Second => date_part(|ts| i64::from(ts.second())),
    }
}

/// Orders two values of like kind; null sorts below everything.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Reference(a), Value::Reference(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare_ordered(a: &LocalRecord, b: &LocalRecord, ordering: &[OrderBy]) -> Ordering {
    for order in ordering {
        let cmp = compare_values(&a.attr(&order.attr), &b.attr(&order.attr))
            .unwrap_or(Ordering::Equal);
        let cmp = match order.direction {
            Direction::Asc => cmp,
            Direction::Desc => cmp.reverse(),
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    a.id.cmp(&b.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use chrono::TimeZone;
    use remstore_codec::{FieldCodec, FieldMapping};
    use remstore_remote::MockRemote;

    fn registry() -> Arc<MappingRegistry> {
        Arc::new(
            MappingRegistry::new()
                .with(EntityMapping::new(
                    "organisation",
                    "Account",
                    vec![
                        FieldMapping::new("name", "Name", FieldCodec::text()),
                        FieldMapping::new("employees", "NumberOfEmployees", FieldCodec::Integer),
                    ],
                ))
                .with(EntityMapping::new(
                    "contact",
                    "Contact",
                    vec![
                        FieldMapping::new("last_name", "LastName", FieldCodec::text()),
                        FieldMapping::new(
                            "organisation",
                            "ParentCustomerId",
                            FieldCodec::reference("organisation"),
                        ),
                    ],
                )),
        )
    }

    fn local_repo(audit: Arc<MemoryAuditSink>) -> Repository {
        Repository::new(
            "organisation",
            registry(),
            Arc::new(LocalStore::new()),
            Arc::new(MockRemote::new()),
            audit,
            EngineConfig::new(),
        )
        .unwrap()
        .local_only()
    }

    fn named(name: &str) -> BTreeMap<String, Value> {
        let mut attrs = BTreeMap::new();
        attrs.insert("name".to_string(), Value::Text(name.into()));
        attrs
    }

    #[test]
    fn unknown_entity_is_rejected_at_construction() {
        let err = Repository::new(
            "widget",
            registry(),
            Arc::new(LocalStore::new()),
            Arc::new(MockRemote::new()),
            Arc::new(MemoryAuditSink::new()),
            EngineConfig::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, EngineError::Codec(_)));
    }

    #[test]
    fn local_only_writes_are_audited() {
        let audit = Arc::new(MemoryAuditSink::new());
        let repo = local_repo(Arc::clone(&audit));

        let record = repo.create(named("Acme")).unwrap();
        assert!(!record.has_remote_id());

        let updated = repo.update(record.id, named("Acme Ltd")).unwrap();
        assert_eq!(updated.attr("name"), Value::Text("Acme Ltd".into()));

        repo.delete(record.id).unwrap();

        let events = audit.events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.cause == AuditCause::Application));
        assert!(events[2].after.is_none());
    }

    #[test]
    fn local_find_filters_and_sorts() {
        let audit = Arc::new(MemoryAuditSink::new());
        let repo = local_repo(audit);
        for name in ["Charlie", "Alpha", "Bravo"] {
            repo.create(named(name)).unwrap();
        }

        let records = repo
            .find_ordered(&attr("name").gt("Alpha"), &[OrderBy::desc("name")])
            .unwrap();
        let names: Vec<Value> = records.iter().map(|r| r.attr("name")).collect();
        assert_eq!(
            names,
            vec![Value::Text("Charlie".into()), Value::Text("Bravo".into())]
        );
    }

    #[test]
    fn local_find_validates_the_query_shape() {
        let audit = Arc::new(MemoryAuditSink::new());
        let repo = local_repo(audit);

        let err = repo.find(&attr("nickname").eq("x")).unwrap_err();
        assert!(matches!(err, EngineError::Query(_)));

        let err = repo
            .find_ordered(&Predicate::empty(), &[OrderBy::asc("nickname")])
            .unwrap_err();
        assert!(matches!(err, EngineError::Query(_)));
    }

    #[test]
    fn get_enforces_exactly_one() {
        let audit = Arc::new(MemoryAuditSink::new());
        let repo = local_repo(audit);
        repo.create(named("Acme")).unwrap();
        repo.create(named("Acme")).unwrap();

        let err = repo.get(&attr("name").eq("Missing")).unwrap_err();
        assert!(matches!(err, EngineError::NoMatch { .. }));

        let err = repo.get(&attr("name").eq("Acme")).unwrap_err();
        assert!(matches!(err, EngineError::MultipleMatches { count: 2, .. }));
    }

    #[test]
    fn refresh_is_unsupported_in_local_mode() {
        let audit = Arc::new(MemoryAuditSink::new());
        let repo = local_repo(audit);
        let record = repo.create(named("Acme")).unwrap();

        let err = repo.refresh(record.id).unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
    }

    #[test]
    fn bulk_writes_are_refused() {
        let audit = Arc::new(MemoryAuditSink::new());
        let repo = local_repo(audit);

        let predicate = attr("name").eq("Acme");
        assert!(matches!(
            repo.update_where(&predicate, BTreeMap::new()),
            Err(EngineError::Unsupported(_))
        ));
        assert!(matches!(
            repo.delete_where(&predicate),
            Err(EngineError::Unsupported(_))
        ));
    }

    #[test]
    fn local_resolve_reference_uses_local_rows() {
        let audit = Arc::new(MemoryAuditSink::new());
        let orgs = local_repo(audit);
        let contacts = orgs.for_entity("contact").unwrap();

        let org = orgs.create(named("Acme")).unwrap();
        // Give the org a remote id by hand, as a bootstrap load would
        orgs.local
            .write_sync_meta("organisation", org.id, "a-1", org.modified_at, None);
        let org = orgs.get_by_remote_id("a-1").unwrap();

        let mut attrs = BTreeMap::new();
        attrs.insert("last_name".to_string(), Value::Text("Doe".into()));
        attrs.insert("organisation".to_string(), Value::Reference("a-1".into()));
        let contact = contacts.create(attrs).unwrap();

        let resolved = contacts.resolve_reference(&contact, "organisation").unwrap();
        assert_eq!(resolved.unwrap().id, org.id);

        let mut orphan_attrs = BTreeMap::new();
        orphan_attrs.insert("last_name".to_string(), Value::Text("Orphan".into()));
        let orphan = contacts.create(orphan_attrs).unwrap();
        assert!(contacts.resolve_reference(&orphan, "organisation").unwrap().is_none());
    }

    #[test]
    fn local_timestamp_ordering_with_date_parts() {
        let audit = Arc::new(MemoryAuditSink::new());
        let repo = local_repo(audit);
        let record = repo.create(named("Acme")).unwrap();

        let year = i64::from(record.modified_at.year());
        let matches = repo.find(&attr("modified_at").year(year)).unwrap();
        assert_eq!(matches.len(), 1);
        let none = repo.find(&attr("modified_at").year(year + 1)).unwrap();
        assert!(none.is_empty());
    }
}
