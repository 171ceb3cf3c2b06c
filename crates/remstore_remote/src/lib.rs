//! # remstore remote
//!
//! The remote entity-service client contract.
//!
//! The remote service is the authoritative system of record, reached over a
//! record-oriented REST protocol with an OData-like filter grammar. This
//! crate specifies it at its interface boundary only:
//! - The [`RemoteStore`] trait with the five synchronous operations
//!   (list/get/create/update/delete)
//! - The [`ListQuery`] push-down shape (filter string, order-by clauses,
//!   top, skip)
//! - The [`RemoteError`] taxonomy
//! - Two test doubles: the scripted [`MockRemote`] and the stateful
//!   in-memory [`MemoryRemote`]
//!
//! Authentication, session handling and HTTP transport live in the concrete
//! client implementation, not here; so does any retry-on-auth-failure
//! policy. The sync engine performs no retries of its own.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod mock;
mod query;
mod store;

pub use error::{RemoteError, RemoteResult};
pub use memory::MemoryRemote;
pub use mock::{MockRemote, RemoteCall};
pub use query::ListQuery;
pub use remstore_codec::Document;
pub use store::RemoteStore;
