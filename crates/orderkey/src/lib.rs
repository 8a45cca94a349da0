//! Composite ordering for typed row sequences: chains of `order by` /
//! `then by` clauses folded into one comparable key per row.
#![warn(unreachable_pub)]

pub mod builder;
pub mod clause;
pub mod direction;
pub mod error;
pub mod key;
pub mod sort;

///
/// Prelude
///
/// Prelude contains only ordering vocabulary.
/// Sorting helpers and errors are imported from their modules.
///

pub mod prelude {
    pub use crate::{
        builder::{AnyRow, CompositeOrderBuilder},
        clause::{KeyComparer, KeySelector, OrderClause},
        direction::OrderDirection,
        key::{CompositeKey, SortKey},
    };
}
