//! Per-entity field-mapping tables, conflict detection and the registry.

use crate::error::{CodecError, CodecResult};
use crate::field::{FieldCodec, FieldMapping};
use crate::value::{parse_wire_timestamp, Document, Value};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Remote field carrying the server-assigned modification timestamp.
pub const MODIFIED_ON_FIELD: &str = "ModifiedOn";

/// Remote field carrying the server-assigned creation timestamp.
const CREATED_ON_FIELD: &str = "CreatedOn";

/// Server-assigned remote fields that must never be sent on create/update.
const SERVER_FIELDS: [&str; 3] = [MODIFIED_ON_FIELD, CREATED_ON_FIELD, "LastVerified"];

/// Local attribute name implicitly mapped onto [`MODIFIED_ON_FIELD`].
const MODIFIED_ATTR: &str = "modified_at";

/// A field-level disagreement between the local and remote copy of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConflict {
    /// The remote store's value.
    pub theirs: Value,
    /// The local store's value.
    pub yours: Value,
}

/// The field-mapping table for one entity type.
///
/// Created once at process start and immutable thereafter. Always contains
/// an implicit `modified_at -> ModifiedOn` timestamp mapping so filters and
/// ordering can address the modification time like any other attribute.
#[derive(Debug, Clone)]
pub struct EntityMapping {
    entity: String,
    service: String,
    fields: BTreeMap<String, FieldMapping>,
}

impl EntityMapping {
    /// Creates a mapping table for `entity`, synchronized against the remote
    /// collection `service`.
    pub fn new(
        entity: impl Into<String>,
        service: impl Into<String>,
        fields: Vec<FieldMapping>,
    ) -> Self {
        let mut table = BTreeMap::new();
        table.insert(
            MODIFIED_ATTR.to_string(),
            FieldMapping::new(MODIFIED_ATTR, MODIFIED_ON_FIELD, FieldCodec::Timestamp),
        );
        for field in fields {
            table.insert(field.local_name.clone(), field);
        }
        Self {
            entity: entity.into(),
            service: service.into(),
            fields: table,
        }
    }

    /// The local entity type name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The remote collection (service) name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The remote field carrying this entity type's identifier.
    pub fn remote_id_field(&self) -> String {
        format!("{}Id", self.service)
    }

    /// Resolves a local attribute to its field mapping.
    ///
    /// Fails with [`CodecError::NotMapped`], the normal signal the query
    /// translator uses to detect unsupported attributes.
    pub fn remote_field(&self, local_name: &str) -> CodecResult<&FieldMapping> {
        self.fields
            .get(local_name)
            .ok_or_else(|| CodecError::not_mapped(local_name))
    }

    /// Extracts the remote id from a document of this entity type.
    pub fn remote_id_of(&self, doc: &Document) -> CodecResult<String> {
        let field = self.remote_id_field();
        match doc.get(&field) {
            Some(serde_json::Value::String(id)) => Ok(id.clone()),
            Some(other) => Err(CodecError::decode(
                field,
                format!("expected a string id, got {other}"),
            )),
            None => Err(CodecError::missing_field(field)),
        }
    }

    /// Extracts the modification timestamp from a remote document.
    pub fn modified_on(&self, doc: &Document) -> CodecResult<DateTime<Utc>> {
        Self::wire_timestamp(doc, MODIFIED_ON_FIELD)
    }

    /// Extracts the creation timestamp from a remote document.
    pub fn created_on(&self, doc: &Document) -> CodecResult<DateTime<Utc>> {
        Self::wire_timestamp(doc, CREATED_ON_FIELD)
    }

    fn wire_timestamp(doc: &Document, field: &str) -> CodecResult<DateTime<Utc>> {
        match doc.get(field) {
            Some(serde_json::Value::String(raw)) => parse_wire_timestamp(raw),
            Some(other) => Err(CodecError::decode(
                field,
                format!("expected a wire timestamp string, got {other}"),
            )),
            None => Err(CodecError::missing_field(field)),
        }
    }

    /// Encodes local attribute values into a remote document.
    ///
    /// Attributes without a mapping are skipped; the local store is free to
    /// carry bookkeeping attributes the remote service never sees.
    pub fn to_remote(&self, attrs: &BTreeMap<String, Value>) -> CodecResult<Document> {
        let mut doc = Document::new();
        for (name, value) in attrs {
            let field = match self.remote_field(name) {
                Ok(field) => field,
                Err(err) if err.is_not_mapped() => continue,
                Err(err) => return Err(err),
            };
            doc.insert(field.remote_name.clone(), field.codec.encode(value)?);
        }
        Ok(doc)
    }

    /// Removes server-assigned fields from an outgoing document.
    ///
    /// The remote service assigns these itself and rejects or ignores
    /// client-supplied values.
    pub fn strip_server_fields(&self, doc: &mut Document) {
        for field in SERVER_FIELDS {
            doc.remove(field);
        }
    }

    /// Decodes the mapped attributes of a remote document.
    ///
    /// The implicit `modified_at` mapping is excluded: record timestamps are
    /// the reconciliation protocol's responsibility, written in their own
    /// scoped step.
    pub fn from_remote(&self, doc: &Document) -> CodecResult<BTreeMap<String, Value>> {
        let mut attrs = BTreeMap::new();
        for (name, field) in &self.fields {
            if name == MODIFIED_ATTR {
                continue;
            }
            let raw = doc.get(&field.remote_name).unwrap_or(&serde_json::Value::Null);
            attrs.insert(name.clone(), field.codec.decode(raw)?);
        }
        Ok(attrs)
    }

    /// Compares a local record's modification time against a remote document.
    ///
    /// Returns `(delta_ms, remote_modified, remote_created)` where
    /// `delta_ms = remote_modified - local_modified` in milliseconds, the
    /// wire format's full precision. Zero means the stores agree; positive
    /// means the remote is newer and authoritative. A negative delta means a
    /// prior write never reached the remote store and fails with
    /// [`CodecError::OutOfSync`].
    pub fn has_changed(
        &self,
        local_modified: DateTime<Utc>,
        doc: &Document,
    ) -> CodecResult<(i64, DateTime<Utc>, DateTime<Utc>)> {
        let remote_modified = self.modified_on(doc)?;
        let remote_created = self.created_on(doc)?;

        let delta_ms = (remote_modified - local_modified).num_milliseconds();
        if delta_ms < 0 {
            return Err(CodecError::OutOfSync { delta_ms });
        }

        Ok((delta_ms, remote_modified, remote_created))
    }

    /// Lists the mapped fields whose local and remote values disagree.
    pub fn conflicting_fields(
        &self,
        attrs: &BTreeMap<String, Value>,
        doc: &Document,
    ) -> CodecResult<BTreeMap<String, FieldConflict>> {
        let mut conflicts = BTreeMap::new();
        for (name, theirs) in self.from_remote(doc)? {
            let yours = attrs.get(&name).cloned().unwrap_or(Value::Null);
            if theirs != yours {
                conflicts.insert(name, FieldConflict { theirs, yours });
            }
        }
        Ok(conflicts)
    }

    /// Iterates over all field mappings, including the implicit one.
    pub fn fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.values()
    }
}

/// Process-wide table of entity mappings, keyed by entity type name.
///
/// Built once at startup and immutable thereafter.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    entries: HashMap<String, Arc<EntityMapping>>,
}

impl MappingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity mapping, consuming and returning the registry so
    /// construction reads as one expression.
    pub fn with(mut self, mapping: EntityMapping) -> Self {
        self.entries
            .insert(mapping.entity().to_string(), Arc::new(mapping));
        self
    }

    /// Looks up the mapping for an entity type.
    pub fn get(&self, entity: &str) -> CodecResult<Arc<EntityMapping>> {
        self.entries
            .get(entity)
            .cloned()
            .ok_or_else(|| CodecError::unknown_entity(entity))
    }

    /// Returns the registered entity type names.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
