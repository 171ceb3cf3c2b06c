//! The list-operation push-down shape.

use serde::{Deserialize, Serialize};

/// Parameters pushed down to the remote list operation.
///
/// Filtering and ordering are rendered by the query translator; paging is
/// the caller's concern (the sync engine never paginates implicitly).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Rendered filter string, if any.
    pub filter: Option<String>,
    /// Rendered order-by clauses, e.g. `"ModifiedOn asc"`.
    pub order_by: Vec<String>,
    /// Maximum number of records to return.
    pub top: Option<u32>,
    /// Number of records to skip.
    pub skip: Option<u32>,
}

impl ListQuery {
    /// Creates an empty list query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter string.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the order-by clauses.
    pub fn with_order_by(mut self, order_by: Vec<String>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Sets the maximum number of records to return.
    pub fn with_top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    /// Sets the number of records to skip.
    pub fn with_skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let query = ListQuery::new()
            .with_filter("Name eq 'Acme'")
            .with_order_by(vec!["ModifiedOn asc".into()])
            .with_top(50)
            .with_skip(100);

        assert_eq!(query.filter.as_deref(), Some("Name eq 'Acme'"));
        assert_eq!(query.order_by, vec!["ModifiedOn asc"]);
        assert_eq!(query.top, Some(50));
        assert_eq!(query.skip, Some(100));
    }
}
