//! Composable boolean predicate tree over named attributes.

use remstore_codec::Value;

/// Abstract comparison operators over one attribute.
///
/// The `i`-prefixed variants are case-insensitive; the date-part variants
/// compare one extracted component of a timestamp attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Equality.
    Exact,
    /// Case-insensitive equality.
    IExact,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Substring containment.
    Contains,
    /// Case-insensitive substring containment.
    IContains,
    /// Prefix match.
    StartsWith,
    /// Case-insensitive prefix match.
    IStartsWith,
    /// Suffix match.
    EndsWith,
    /// Case-insensitive suffix match.
    IEndsWith,
    /// Year component of a timestamp.
    Year,
    /// Month component of a timestamp.
    Month,
    /// Day component of a timestamp.
    Day,
    /// Hour component of a timestamp.
    Hour,
    /// Minute component of a timestamp.
    Minute,
    /// Second component of a timestamp.
    Second,
}

/// One attribute comparison: the leaf of a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Local attribute name, resolved through the field mapping at render
    /// time.
    pub attr: String,
    /// Comparison operator.
    pub op: Comparison,
    /// Comparison value.
    pub value: Value,
}

impl Condition {
    /// Creates a condition.
    pub fn new(attr: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self {
            attr: attr.into(),
            op,
            value: value.into(),
        }
    }
}

/// A boolean AND/OR/NOT tree whose leaves are attribute comparisons.
///
/// Built directly by repository callers through the fluent [`attr`] builder:
///
/// ```
/// use remstore_query::attr;
///
/// let predicate = attr("name").eq("Acme").and(attr("employees").gte(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A single attribute comparison.
    Leaf(Condition),
    /// Conjunction of child predicates.
    And(Vec<Predicate>),
    /// Disjunction of child predicates.
    Or(Vec<Predicate>),
    /// Negation of a child predicate.
    Not(Box<Predicate>),
}

impl Predicate {
    /// A predicate with no conditions; renders to no filter at all.
    pub fn empty() -> Self {
        Predicate::And(Vec::new())
    }

    /// Returns true if this predicate contains no conditions.
    pub fn is_empty(&self) -> bool {
        match self {
            Predicate::Leaf(_) => false,
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().all(Predicate::is_empty)
            }
            Predicate::Not(inner) => inner.is_empty(),
        }
    }

    /// Conjunction with another predicate.
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut children) => {
                children.push(other);
                Predicate::And(children)
            }
            node => Predicate::And(vec![node, other]),
        }
    }

    /// Disjunction with another predicate.
    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut children) => {
                children.push(other);
                Predicate::Or(children)
            }
            node => Predicate::Or(vec![node, other]),
        }
    }

    /// Negation of this predicate.
    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

/// Starts a fluent condition on a named attribute.
pub fn attr(name: impl Into<String>) -> Attr {
    Attr(name.into())
}

/// A named attribute awaiting a comparison; produced by [`attr`].
#[derive(Debug, Clone)]
pub struct Attr(String);

macro_rules! comparison_method {
    ($(#[$doc:meta])* $name:ident, $op:ident) => {
        $(#[$doc])*
        pub fn $name(self, value: impl Into<Value>) -> Predicate {
            Predicate::Leaf(Condition::new(self.0, Comparison::$op, value))
        }
    };
}

impl Attr {
    comparison_method!(
        /// Equality comparison.
        eq, Exact
    );
    comparison_method!(
        /// Case-insensitive equality comparison.
        eq_ci, IExact
    );
    comparison_method!(
        /// Strictly-less-than comparison.
        lt, Lt
    );
    comparison_method!(
        /// Less-than-or-equal comparison.
        lte, Lte
    );
    comparison_method!(
        /// Strictly-greater-than comparison.
        gt, Gt
    );
    comparison_method!(
        /// Greater-than-or-equal comparison.
        gte, Gte
    );
    comparison_method!(
        /// Substring containment.
        contains, Contains
    );
    comparison_method!(
        /// Case-insensitive substring containment.
        contains_ci, IContains
    );
    comparison_method!(
        /// Prefix match.
        starts_with, StartsWith
    );
    comparison_method!(
        /// Case-insensitive prefix match.
        starts_with_ci, IStartsWith
    );
    comparison_method!(
        /// Suffix match.
        ends_with, EndsWith
    );
    comparison_method!(
        /// Case-insensitive suffix match.
        ends_with_ci, IEndsWith
    );
    comparison_method!(
        /// Year component of a timestamp attribute.
        year, Year
    );
    comparison_method!(
        /// Month component of a timestamp attribute.
        month, Month
    );
    comparison_method!(
        /// Day component of a timestamp attribute.
        day, Day
    );
    comparison_method!(
        /// Hour component of a timestamp attribute.
        hour, Hour
    );
    comparison_method!(
        /// Minute component of a timestamp attribute.
        minute, Minute
    );
    comparison_method!(
        /// Second component of a timestamp attribute.
        second, Second
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_leaves() {
        let predicate = attr("name").eq("Acme");
        assert_eq!(
            predicate,
            Predicate::Leaf(Condition::new("name", Comparison::Exact, "Acme"))
        );
    }

    #[test]
    fn and_flattens_into_existing_conjunction() {
        let predicate = attr("a")
            .eq(1)
            .and(attr("b").eq(2))
            .and(attr("c").eq(3));

        match predicate {
            Predicate::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn empty_detection() {
        assert!(Predicate::empty().is_empty());
        assert!(Predicate::empty().negate().is_empty());
        assert!(!attr("a").eq(1).is_empty());
        assert!(!Predicate::empty().and(attr("a").eq(1)).is_empty());
    }
}
