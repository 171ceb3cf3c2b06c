//! # remstore codec
//!
//! Value model and field-mapping tables for the remstore sync engine.
//!
//! This crate provides:
//! - The dynamic attribute [`Value`] type shared by the local store and the
//!   filter translator
//! - Wire timestamp conversion (the remote service speaks `/Date(<millis>)/`)
//! - Bidirectional per-field codecs ([`FieldCodec`]) including the
//!   `{"Id": ...}` reference wrapper and the `{"Value": ...}` option-set
//!   wrapper
//! - Per-entity-type [`EntityMapping`] tables with conflict detection
//! - The process-wide, immutable [`MappingRegistry`]
//!
//! ## Key Invariants
//!
//! - `decode(encode(v)) == v` for every codec, including null/blank values
//! - A local record whose modification timestamp is ahead of the remote's is
//!   a hard consistency fault ([`CodecError::OutOfSync`]), never merged
//! - [`CodecError::NotMapped`] is a normal internal signal used by the query
//!   translator to detect unsupported attributes, not a fatal error

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod field;
mod mapping;
mod value;

pub use error::{CodecError, CodecResult};
pub use field::{FieldCodec, FieldMapping};
pub use mapping::{EntityMapping, FieldConflict, MappingRegistry, MODIFIED_ON_FIELD};
pub use value::{format_wire_timestamp, parse_wire_timestamp, Document, Value};
