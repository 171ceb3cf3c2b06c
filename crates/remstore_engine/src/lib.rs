//! # remstore engine
//!
//! The dual-store synchronization engine.
//!
//! A local relational store is kept eventually consistent with a remote
//! entity service that is the system of record. The [`Repository`] facade
//! is the single entry point per entity type:
//!
//! - Reads reconcile: bulk and point lookups fetch remote state and merge
//!   anything newer into the local store before returning, comparing
//!   modification timestamps. A local record ahead of the remote is a fatal
//!   out-of-sync fault, never merged.
//! - Writes are remote-first: the local effect of a create, update or
//!   delete commits only once the remote store confirms, and rolls back
//!   otherwise.
//!
//! Every committed local write is reported to an [`AuditSink`] with its
//! before and after images. The engine performs no retries, keeps no
//! timers and runs no background work; it does exactly one remote round
//! trip per logical operation (plus the read-before-write a whole-resource
//! update needs).
//!
//! ```no_run
//! use remstore_engine::{attr, EngineConfig, LocalStore, NullAuditSink, Repository};
//! use remstore_codec::{EntityMapping, FieldCodec, FieldMapping, MappingRegistry};
//! use remstore_remote::MemoryRemote;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), remstore_engine::EngineError> {
//! let registry = Arc::new(MappingRegistry::new().with(EntityMapping::new(
//!     "organisation",
//!     "Account",
//!     vec![FieldMapping::new("name", "Name", FieldCodec::text())],
//! )));
//! let repo = Repository::new(
//!     "organisation",
//!     registry,
//!     Arc::new(LocalStore::new()),
//!     Arc::new(MemoryRemote::new()),
//!     Arc::new(NullAuditSink),
//!     EngineConfig::new(),
//! )?;
//! let acmes = repo.find(&attr("name").eq("Acme"))?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod compiler;
mod config;
mod error;
mod local;
mod repository;

pub use audit::{AuditCause, AuditEvent, AuditSink, MemoryAuditSink, NullAuditSink};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use local::{LocalRecord, LocalStore};
pub use repository::Repository;

// Re-exported so repository callers can build queries without importing
// the query crate themselves.
pub use remstore_codec::Value;
pub use remstore_query::{attr, OrderBy, Predicate};
