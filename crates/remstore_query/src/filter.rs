//! Rendering predicate trees into the remote filter-string grammar.

use crate::error::{QueryError, QueryResult};
use crate::predicate::{Comparison, Condition, Predicate};
use remstore_codec::{EntityMapping, Value};

/// Renders a predicate into the remote filter grammar.
///
/// Returns `None` for a predicate without conditions (no filter is sent).
/// Rendering is deterministic: AND/OR children are sorted lexicographically
/// after rendering, so repeated calls with the same logical predicate
/// produce byte-identical strings.
pub fn render_filter(
    predicate: &Predicate,
    mapping: &EntityMapping,
) -> QueryResult<Option<String>> {
    let rendered = render_node(predicate, mapping)?;
    if rendered.is_empty() {
        Ok(None)
    } else {
        Ok(Some(rendered))
    }
}

fn render_node(node: &Predicate, mapping: &EntityMapping) -> QueryResult<String> {
    match node {
        Predicate::Leaf(condition) => render_condition(condition, mapping),
        Predicate::And(children) => render_group(children, "and", mapping),
        Predicate::Or(children) => render_group(children, "or", mapping),
        Predicate::Not(inner) => {
            let rendered = match inner.as_ref() {
                // Negation supplies its own parentheses; rendering the
                // children directly avoids doubling them up.
                Predicate::And(children) => render_children(children, "and", mapping)?,
                Predicate::Or(children) => render_children(children, "or", mapping)?,
                other => render_node(other, mapping)?,
            };
            if rendered.is_empty() {
                Ok(String::new())
            } else {
                Ok(format!("not ({rendered})"))
            }
        }
    }
}

/// Renders and joins a node's children, sorted for determinism.
fn render_children(
    children: &[Predicate],
    connector: &str,
    mapping: &EntityMapping,
) -> QueryResult<String> {
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        let rendered = render_node(child, mapping)?;
        if !rendered.is_empty() {
            parts.push(rendered);
        }
    }
    parts.sort();
    Ok(parts.join(&format!(" {connector} ")))
}

fn render_group(
    children: &[Predicate],
    connector: &str,
    mapping: &EntityMapping,
) -> QueryResult<String> {
    let joined = render_children(children, connector, mapping)?;
    let non_empty = children.iter().filter(|c| !c.is_empty()).count();
    if non_empty > 1 {
        Ok(format!("({joined})"))
    } else {
        Ok(joined)
    }
}

fn render_condition(condition: &Condition, mapping: &EntityMapping) -> QueryResult<String> {
    let field = match mapping.remote_field(&condition.attr) {
        Ok(field) => field,
        Err(err) if err.is_not_mapped() => {
            return Err(QueryError::unsupported(format!(
                "cannot filter by {}, only directly mapped fields are supported",
                condition.attr
            )))
        }
        Err(err) => return Err(err.into()),
    };

    if condition.value.is_null() {
        return Err(QueryError::unsupported(format!(
            "cannot compare {} against null",
            condition.attr
        )));
    }

    // Reference attributes are addressed by remote id and the grammar only
    // supports resolving them through an equality key.
    let field_name = if field.is_reference() {
        if condition.op != Comparison::Exact {
            return Err(QueryError::unsupported(format!(
                "reference attribute {} only supports equality",
                condition.attr
            )));
        }
        if condition.value.as_reference().is_none() {
            return Err(QueryError::unsupported(format!(
                "filtering by {} requires a whole related record, not a bare value",
                condition.attr
            )));
        }
        format!("{}/Id", field.remote_name)
    } else {
        field.remote_name.clone()
    };

    let value = literal(&condition.value);
    let expr = match condition.op {
        Comparison::Exact | Comparison::IExact => format!("{field_name} eq {value}"),
        Comparison::Lt => format!("{field_name} lt {value}"),
        Comparison::Lte => format!("{field_name} le {value}"),
        Comparison::Gt => format!("{field_name} gt {value}"),
        Comparison::Gte => format!("{field_name} ge {value}"),
        Comparison::Contains | Comparison::IContains => {
            format!("substringof({value}, {field_name})")
        }
        Comparison::StartsWith => format!("startswith({field_name}, {value})"),
        Comparison::IStartsWith => {
            format!("startswith({field_name}, tolower({value}))")
        }
        Comparison::EndsWith => format!("endswith({field_name}, {value})"),
        Comparison::IEndsWith => format!("endswith({field_name}, tolower({value}))"),
        Comparison::Year => format!("year({field_name}) eq {value}"),
        Comparison::Month => format!("month({field_name}) eq {value}"),
        Comparison::Day => format!("day({field_name}) eq {value}"),
        Comparison::Hour => format!("hour({field_name}) eq {value}"),
        Comparison::Minute => format!("minute({field_name}) eq {value}"),
        Comparison::Second => format!("second({field_name}) eq {value}"),
    };
    Ok(expr)
}

/// Renders a comparison value as a remote filter literal.
fn literal(value: &Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Timestamp(t) => {
            format!("datetime'{}'", t.format("%Y-%m-%dT%H:%M:%S"))
        }
        Value::Reference(id) => format!("guid'{id}'"),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        // Null is rejected before literal rendering
        Value::Null => String::new(),
    }
}
