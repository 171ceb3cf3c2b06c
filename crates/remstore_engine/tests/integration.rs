//! End-to-end tests for the synchronization engine: reconciling reads,
//! remote-first writes with rollback, filter push-down and reference
//! handling.

use chrono::{DateTime, Duration, TimeZone, Utc};
use remstore_codec::{
    format_wire_timestamp, EntityMapping, FieldCodec, FieldMapping, MappingRegistry,
};
use remstore_engine::{
    attr, AuditCause, EngineConfig, EngineError, LocalStore, MemoryAuditSink, OrderBy,
    Predicate, Repository, Value,
};
use remstore_remote::{Document, MemoryRemote, MockRemote, RemoteCall, RemoteError, RemoteStore};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn registry() -> Arc<MappingRegistry> {
    Arc::new(
        MappingRegistry::new()
            .with(EntityMapping::new(
                "organisation",
                "Account",
                vec![
                    FieldMapping::new("name", "Name", FieldCodec::text()),
                    FieldMapping::new("int_field", "IntField", FieldCodec::Integer),
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

struct Harness {
    repo: Repository,
    local: Arc<LocalStore>,
    audit: Arc<MemoryAuditSink>,
}

fn harness(remote: Arc<dyn RemoteStore>) -> Harness {
    init_tracing();
    let local = Arc::new(LocalStore::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let repo = Repository::new(
        "organisation",
        registry(),
        Arc::clone(&local),
        remote,
        Arc::clone(&audit) as Arc<dyn remstore_engine::AuditSink>,
        EngineConfig::new(),
    )
    .unwrap();
    Harness { repo, local, audit }
}

fn stamp(min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, min, 0).unwrap()
}

fn account_doc(remote_id: &str, name: &str, modified: DateTime<Utc>) -> Document {
    let mut doc = Document::new();
    doc.insert("AccountId".into(), json!(remote_id));
    doc.insert("Name".into(), json!(name));
    doc.insert("IntField".into(), json!(10));
    doc.insert("ModifiedOn".into(), json!(format_wire_timestamp(modified)));
    doc.insert("CreatedOn".into(), json!(format_wire_timestamp(stamp(0))));
    doc
}

fn named(name: &str) -> BTreeMap<String, Value> {
    let mut attrs = BTreeMap::new();
    attrs.insert("name".to_string(), Value::Text(name.into()));
    attrs
}

// A remote record with no local counterpart is adopted: one new row with
// the remote id set and modified_at taken from the remote document.
#[test]
fn list_adopts_unknown_remote_record() {
    let mock = Arc::new(MockRemote::new());
    mock.queue_list(Ok(vec![account_doc("a-1", "Acme", stamp(5))]));
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let records = h.repo.find(&Predicate::empty()).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].remote_id, "a-1");
    assert_eq!(records[0].modified_at, stamp(5));
    assert_eq!(records[0].attr("name"), Value::Text("Acme".into()));
    assert_eq!(h.local.len("organisation"), 1);

    let events = h.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, AuditCause::Reconciliation);
}

// An in-sync pair performs zero local writes and keeps local attribute
// values rather than re-decoding the remote document.
#[test]
fn in_sync_record_is_untouched() {
    let mock = Arc::new(MockRemote::new());
    mock.queue_list(Ok(vec![account_doc("a-1", "Remote Name", stamp(5))]));
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    h.local.insert(
        "organisation",
        "a-1".into(),
        stamp(0),
        stamp(5),
        named("Local Name"),
    );

    let records = h.repo.find(&Predicate::empty()).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].attr("name"), Value::Text("Local Name".into()));
    assert!(h.audit.is_empty());
}

// The filter for a two-condition conjunction is rendered deterministically
// and pushed down on the list call.
#[test]
fn conjunction_filter_is_pushed_down() {
    let mock = Arc::new(MockRemote::new());
    mock.queue_list(Ok(Vec::new()));
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let predicate = attr("name").eq("Acme").and(attr("int_field").eq(10));
    h.repo
        .find_ordered(&predicate, &[OrderBy::asc("modified_at")])
        .unwrap();

    match &mock.calls()[0] {
        RemoteCall::List { filter, order_by, service } => {
            assert_eq!(service, "Account");
            assert_eq!(filter.as_deref(), Some("(IntField eq 10 and Name eq 'Acme')"));
            assert_eq!(order_by, &vec!["ModifiedOn asc".to_string()]);
        }
        other => panic!("expected a list call, got {other:?}"),
    }
}

// A failed remote update rolls the local attribute write back.
#[test]
fn failed_update_rolls_back() {
    let mock = Arc::new(MockRemote::new());
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let row = h.local.insert(
        "organisation",
        "a-1".into(),
        stamp(0),
        stamp(5),
        named("Before"),
    );

    mock.queue_get(Ok(account_doc("a-1", "Before", stamp(5))));
    mock.queue_update(Err(RemoteError::transport("connection reset")));

    let err = h.repo.update(row.id, named("After")).unwrap_err();
    assert!(matches!(err, EngineError::Remote(_)));

    let row = h.local.get("organisation", row.id).unwrap();
    assert_eq!(row.attr("name"), Value::Text("Before".into()));
    assert_eq!(row.modified_at, stamp(5));
    assert!(h.audit.is_empty());
}

// A failed remote create rolls the optimistic local insert back.
#[test]
fn failed_create_rolls_back() {
    let mock = Arc::new(MockRemote::new());
    mock.queue_create(Err(RemoteError::transport("connection reset")));
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let err = h.repo.create(named("Acme")).unwrap_err();
    assert!(matches!(err, EngineError::Remote(_)));

    assert_eq!(h.local.len("organisation"), 0);
    assert!(h.audit.is_empty());

    // The rolled-back row does not leak its id: the next create starts over
    mock.queue_create(Ok(account_doc("a-1", "Acme", stamp(5))));
    let record = h.repo.create(named("Acme")).unwrap();
    assert_eq!(record.remote_id, "a-1");
    assert_eq!(h.local.len("organisation"), 1);
    assert_eq!(h.audit.len(), 1);
}

// Ordering by an unmapped attribute fails before any remote call.
#[test]
fn unmapped_ordering_fails_before_remote_call() {
    let mock = Arc::new(MockRemote::new());
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let err = h
        .repo
        .find_ordered(&Predicate::empty(), &[OrderBy::asc("nickname")])
        .unwrap_err();

    assert!(matches!(err, EngineError::Query(_)));
    assert_eq!(mock.call_count(), 0);
}

// The wire format carries milliseconds, so a remote record half a second
// newer is merged, not mistaken for in-sync.
#[test]
fn subsecond_newer_remote_is_merged() {
    let mock = Arc::new(MockRemote::new());
    let remote_modified = stamp(5) + Duration::milliseconds(500);
    mock.queue_list(Ok(vec![account_doc("a-1", "New", remote_modified)]));
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    h.local.insert(
        "organisation",
        "a-1".into(),
        stamp(0),
        stamp(5),
        named("Old"),
    );

    let records = h.repo.find(&Predicate::empty()).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].attr("name"), Value::Text("New".into()));
    assert_eq!(records[0].modified_at, remote_modified);
    assert_eq!(h.audit.len(), 1);
}

// And the mirrored sub-second case: a local record half a second ahead is
// the out-of-sync fault, not silently accepted.
#[test]
fn subsecond_local_lead_is_fatal() {
    let mock = Arc::new(MockRemote::new());
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let row = h.local.insert(
        "organisation",
        "a-1".into(),
        stamp(0),
        stamp(5) + Duration::milliseconds(500),
        named("Ahead"),
    );
    mock.queue_get(Ok(account_doc("a-1", "Behind", stamp(5))));

    let err = h.repo.refresh(row.id).unwrap_err();
    assert!(err.is_out_of_sync());
    assert_eq!(
        h.local.get("organisation", row.id).unwrap().attr("name"),
        Value::Text("Ahead".into())
    );
    assert!(h.audit.is_empty());
}

// A local record newer than the remote is the fatal out-of-sync fault and
// leaves the local row untouched.
#[test]
fn local_ahead_of_remote_is_fatal() {
    let mock = Arc::new(MockRemote::new());
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let row = h.local.insert(
        "organisation",
        "a-1".into(),
        stamp(0),
        stamp(9),
        named("Ahead"),
    );
    mock.queue_get(Ok(account_doc("a-1", "Behind", stamp(5))));

    let err = h.repo.refresh(row.id).unwrap_err();
    assert!(err.is_out_of_sync());

    let row = h.local.get("organisation", row.id).unwrap();
    assert_eq!(row.modified_at, stamp(9));
    assert_eq!(row.attr("name"), Value::Text("Ahead".into()));
    assert!(h.audit.is_empty());
}

// A locally unknown remote id falls back to a point refresh that adopts
// the remote record.
#[test]
fn get_by_remote_id_falls_back_to_remote() {
    let mock = Arc::new(MockRemote::new());
    mock.queue_get(Ok(account_doc("a-7", "Acme", stamp(5))));
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let record = h.repo.get_by_remote_id("a-7").unwrap();
    assert_eq!(record.remote_id, "a-7");
    assert_eq!(h.local.len("organisation"), 1);

    // Second lookup is served locally
    h.repo.get_by_remote_id("a-7").unwrap();
    assert_eq!(mock.call_count(), 1);

    mock.queue_get(Err(RemoteError::not_found("Account", "a-8")));
    let err = h.repo.get_by_remote_id("a-8").unwrap_err();
    assert!(matches!(err, EngineError::UnknownRemoteId { .. }));
}

// find_children pushes a reference filter down and warms the parent, so
// resolving the back reference costs no remote call.
#[test]
fn find_children_filters_and_warms_parent() {
    let mock = Arc::new(MockRemote::new());
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let parent = h.local.insert(
        "organisation",
        "a-1".into(),
        stamp(0),
        stamp(5),
        named("Acme"),
    );

    let mut child_doc = Document::new();
    child_doc.insert("ContactId".into(), json!("c-1"));
    child_doc.insert("LastName".into(), json!("Doe"));
    child_doc.insert("ParentCustomerId".into(), json!({ "Id": "a-1" }));
    child_doc.insert("ModifiedOn".into(), json!(format_wire_timestamp(stamp(4))));
    child_doc.insert("CreatedOn".into(), json!(format_wire_timestamp(stamp(0))));
    mock.queue_list(Ok(vec![child_doc]));

    let children = h
        .repo
        .find_children("contact", "organisation", &parent)
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(
        children[0].attr("organisation"),
        Value::Reference("a-1".into())
    );
    match &mock.calls()[0] {
        RemoteCall::List { filter, service, .. } => {
            assert_eq!(service, "Contact");
            assert_eq!(filter.as_deref(), Some("ParentCustomerId/Id eq guid'a-1'"));
        }
        other => panic!("expected a list call, got {other:?}"),
    }

    let contacts = h.repo.for_entity("contact").unwrap();
    let resolved = contacts
        .resolve_reference(&children[0], "organisation")
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id, parent.id);
    // Only the list call, the warmed parent answered the reference
    assert_eq!(mock.call_count(), 1);
}

// Full record lifetime against the stateful in-memory service.
#[test]
fn memory_remote_end_to_end() {
    let memory = Arc::new(MemoryRemote::new());
    let h = harness(Arc::clone(&memory) as Arc<dyn RemoteStore>);

    // Create: remote id and server timestamp are backfilled
    let mut attrs = named("Acme");
    attrs.insert("int_field".to_string(), Value::Integer(1));
    let record = h.repo.create(attrs).unwrap();
    assert!(record.has_remote_id());
    assert_eq!(record.modified_at, memory.now() - Duration::seconds(1));
    assert_eq!(memory.count("Account"), 1);

    // Update: the confirmed ModifiedOn lands locally
    let updated = h
        .repo
        .update(record.id, named("Acme Ltd"))
        .unwrap();
    assert!(updated.modified_at > record.modified_at);
    assert_eq!(updated.attr("name"), Value::Text("Acme Ltd".into()));
    assert_eq!(updated.attr("int_field"), Value::Integer(1));

    // A second handle over a fresh local store adopts the record
    let other = harness(Arc::clone(&memory) as Arc<dyn RemoteStore>);
    let adopted = other.repo.get_by_remote_id(&updated.remote_id).unwrap();
    assert_eq!(adopted.attr("name"), Value::Text("Acme Ltd".into()));
    assert_eq!(adopted.modified_at, updated.modified_at);

    // Refresh of the in-sync pair changes nothing
    let refreshed = other.repo.refresh(adopted.id).unwrap();
    assert_eq!(refreshed, adopted);

    // Delete removes both sides
    h.repo.delete(record.id).unwrap();
    assert_eq!(memory.count("Account"), 0);
    assert_eq!(h.local.len("organisation"), 0);

    let events = h.audit.events();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.cause == AuditCause::Application));
}

// Reconciliation is idempotent: repeating the same list leaves the local
// store unchanged after the first pass.
#[test]
fn repeated_reconciliation_is_idempotent() {
    let mock = Arc::new(MockRemote::new());
    mock.queue_list(Ok(vec![account_doc("a-1", "Acme", stamp(5))]));
    mock.queue_list(Ok(vec![account_doc("a-1", "Acme", stamp(5))]));
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);

    let first = h.repo.find(&Predicate::empty()).unwrap();
    let second = h.repo.find(&Predicate::empty()).unwrap();

    assert_eq!(first, second);
    assert_eq!(h.local.len("organisation"), 1);
    assert_eq!(h.audit.len(), 1);
}

// A local-only handle never touches the remote store but still audits.
#[test]
fn local_only_handle_skips_remote() {
    let mock = Arc::new(MockRemote::new());
    let h = harness(Arc::clone(&mock) as Arc<dyn RemoteStore>);
    let local_repo = h.repo.local_only();

    let record = local_repo.create(named("Acme")).unwrap();
    local_repo.update(record.id, named("Acme Ltd")).unwrap();
    let found = local_repo.find(&attr("name").eq("Acme Ltd")).unwrap();
    assert_eq!(found.len(), 1);
    local_repo.delete(record.id).unwrap();

    assert_eq!(mock.call_count(), 0);
    assert_eq!(h.audit.len(), 3);
}
