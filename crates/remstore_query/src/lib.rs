//! # remstore query
//!
//! Predicate trees and their translation into the remote service's
//! filter-string grammar.
//!
//! This crate provides:
//! - A composable boolean [`Predicate`] tree (AND/OR/NOT over attribute
//!   comparisons) with a fluent builder
//! - Deterministic rendering into the remote filter grammar
//!   ([`render_filter`]): AND/OR children are sorted lexicographically so
//!   the same logical predicate always produces byte-identical output
//! - Ordering translation ([`render_order_by`]), restricted to directly
//!   mapped attributes
//!
//! Unsupported query shapes fail with [`QueryError::Unsupported`] before
//! any remote call is made; the translator never silently degrades.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod filter;
mod order;
mod predicate;

pub use error::{QueryError, QueryResult};
pub use filter::render_filter;
pub use order::{render_order_by, Direction, OrderBy};
pub use predicate::{attr, Comparison, Condition, Predicate};
