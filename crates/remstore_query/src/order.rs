//! Ordering translation into remote order-by clauses.

use crate::error::{QueryError, QueryResult};
use remstore_codec::EntityMapping;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One requested ordering: an attribute and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Local attribute name.
    pub attr: String,
    /// Sort direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending ordering on an attribute.
    pub fn asc(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending ordering on an attribute.
    pub fn desc(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            direction: Direction::Desc,
        }
    }
}

/// Translates an ordering list into remote order-by clauses.
///
/// Each attribute must resolve through the field mapping; reference
/// attributes sort by the reference field itself. Ordering by an unmapped
/// or derived attribute is unsupported, because the local iteration order
/// and the remote fetch order must match for reconciliation to be sound.
pub fn render_order_by(
    ordering: &[OrderBy],
    mapping: &EntityMapping,
) -> QueryResult<Vec<String>> {
    let mut clauses = Vec::with_capacity(ordering.len());
    for order in ordering {
        let field = match mapping.remote_field(&order.attr) {
            Ok(field) => field,
            Err(err) if err.is_not_mapped() => {
                return Err(QueryError::unsupported(format!(
                    "cannot order by {}, only directly mapped fields are supported",
                    order.attr
                )))
            }
            Err(err) => return Err(err.into()),
        };
        clauses.push(format!("{} {}", field.remote_name, order.direction.keyword()));
    }
    Ok(clauses)
}
