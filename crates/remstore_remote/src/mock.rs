//! A scripted remote store for testing.

use crate::error::{RemoteError, RemoteResult};
use crate::query::ListQuery;
use crate::store::RemoteStore;
use parking_lot::Mutex;
use remstore_codec::Document;
use std::collections::VecDeque;

/// A record of one call made against a [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// A list call.
    List {
        /// Service name.
        service: String,
        /// Filter string that was pushed down.
        filter: Option<String>,
        /// Order-by clauses that were pushed down.
        order_by: Vec<String>,
    },
    /// A get call.
    Get {
        /// Service name.
        service: String,
        /// Requested remote id.
        remote_id: String,
    },
    /// A create call.
    Create {
        /// Service name.
        service: String,
    },
    /// An update call.
    Update {
        /// Service name.
        service: String,
        /// Updated remote id.
        remote_id: String,
    },
    /// A delete call.
    Delete {
        /// Service name.
        service: String,
        /// Deleted remote id.
        remote_id: String,
    },
}

/// A scripted remote store.
///
/// Responses are queued per operation and consumed in order; an exhausted
/// queue fails with a protocol error. Every call is logged so tests can
/// assert how (and whether) the remote service was reached.
#[derive(Debug, Default)]
pub struct MockRemote {
    list_results: Mutex<VecDeque<RemoteResult<Vec<Document>>>>,
    get_results: Mutex<VecDeque<RemoteResult<Document>>>,
    create_results: Mutex<VecDeque<RemoteResult<Document>>>,
    update_results: Mutex<VecDeque<RemoteResult<Document>>>,
    delete_results: Mutex<VecDeque<RemoteResult<()>>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl MockRemote {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next list call.
    pub fn queue_list(&self, result: RemoteResult<Vec<Document>>) {
        self.list_results.lock().push_back(result);
    }

    /// Queues a response for the next get call.
    pub fn queue_get(&self, result: RemoteResult<Document>) {
        self.get_results.lock().push_back(result);
    }

    /// Queues a response for the next create call.
    pub fn queue_create(&self, result: RemoteResult<Document>) {
        self.create_results.lock().push_back(result);
    }

    /// Queues a response for the next update call.
    pub fn queue_update(&self, result: RemoteResult<Document>) {
        self.update_results.lock().push_back(result);
    }

    /// Queues a response for the next delete call.
    pub fn queue_delete(&self, result: RemoteResult<()>) {
        self.delete_results.lock().push_back(result);
    }

    /// Returns a snapshot of all calls made so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn next<T>(queue: &Mutex<VecDeque<RemoteResult<T>>>, op: &str) -> RemoteResult<T> {
        queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Protocol(format!("no scripted {op} response"))))
    }
}

impl RemoteStore for MockRemote {
    fn list(&self, service: &str, query: &ListQuery) -> RemoteResult<Vec<Document>> {
        self.calls.lock().push(RemoteCall::List {
            service: service.to_string(),
            filter: query.filter.clone(),
            order_by: query.order_by.clone(),
        });
        Self::next(&self.list_results, "list")
    }

    fn get(&self, service: &str, remote_id: &str) -> RemoteResult<Document> {
        self.calls.lock().push(RemoteCall::Get {
            service: service.to_string(),
            remote_id: remote_id.to_string(),
        });
        Self::next(&self.get_results, "get")
    }

    fn create(&self, service: &str, _data: Document) -> RemoteResult<Document> {
        self.calls.lock().push(RemoteCall::Create {
            service: service.to_string(),
        });
        Self::next(&self.create_results, "create")
    }

    fn update(
        &self,
        service: &str,
        remote_id: &str,
        _data: Document,
    ) -> RemoteResult<Document> {
        self.calls.lock().push(RemoteCall::Update {
            service: service.to_string(),
            remote_id: remote_id.to_string(),
        });
        Self::next(&self.update_results, "update")
    }

    fn delete(&self, service: &str, remote_id: &str) -> RemoteResult<()> {
        self.calls.lock().push(RemoteCall::Delete {
            service: service.to_string(),
            remote_id: remote_id.to_string(),
        });
        Self::next(&self.delete_results, "delete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_responses_consumed_in_order() {
        let mock = MockRemote::new();
        mock.queue_get(Ok(Document::new()));
        mock.queue_get(Err(RemoteError::not_found("Account", "a-2")));

        assert!(mock.get("Account", "a-1").is_ok());
        assert!(mock.get("Account", "a-2").unwrap_err().is_not_found());
    }

    #[test]
    fn exhausted_queue_is_a_protocol_error() {
        let mock = MockRemote::new();
        let err = mock.delete("Account", "a-1").unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }

    #[test]
    fn calls_are_logged() {
        let mock = MockRemote::new();
        mock.queue_list(Ok(Vec::new()));
        let query = ListQuery::new().with_filter("Name eq 'Acme'");
        mock.list("Account", &query).unwrap();

        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            mock.calls()[0],
            RemoteCall::List {
                service: "Account".into(),
                filter: Some("Name eq 'Acme'".into()),
                order_by: Vec::new(),
            }
        );
    }
}
