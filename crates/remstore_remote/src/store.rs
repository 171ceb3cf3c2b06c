//! The remote store client contract.

use crate::error::RemoteResult;
use crate::query::ListQuery;
use remstore_codec::Document;

/// A client for the remote entity service.
///
/// All operations are synchronous and return decoded key-value documents or
/// fail with a [`crate::RemoteError`]. Timeouts, cancellation and
/// transparent re-authentication are implementation concerns of the
/// concrete client; the sync engine layers no policy of its own on top.
pub trait RemoteStore: Send + Sync {
    /// Lists records of a service, with filtering/ordering/paging pushed
    /// down. Returns documents in the service's sort order.
    fn list(&self, service: &str, query: &ListQuery) -> RemoteResult<Vec<Document>>;

    /// Fetches one record by remote id.
    fn get(&self, service: &str, remote_id: &str) -> RemoteResult<Document>;

    /// Creates a record and returns the created document, which includes
    /// the new remote id and server-assigned timestamps.
    fn create(&self, service: &str, data: Document) -> RemoteResult<Document>;

    /// Updates a record and returns the updated document.
    fn update(&self, service: &str, remote_id: &str, data: Document)
        -> RemoteResult<Document>;

    /// Deletes a record.
    fn delete(&self, service: &str, remote_id: &str) -> RemoteResult<()>;
}
