
use crate::{
    clause::{KeyComparer, KeySelector, OrderClause, RowCast},
    direction::OrderDirection,
    error::OrderError,
    key::CompositeKey,
};
use std::{any::Any, cmp::Ordering, fmt, iter::FusedIterator, sync::Arc};
use tracing::{debug, trace, warn};

type NodeId = usize;

/// Type-erased row accepted by builders forked with `clone_cast_any`.
pub type AnyRow = Arc<dyn Any + Send + Sync>;

///
/// ClauseNode
///
/// Arena slot for one clause. Nodes are never removed, so a `NodeId`
/// stays valid for the lifetime of the builder that issued it.
///

struct ClauseNode<T> {
    clause: OrderClause<T>,
    next: Option<NodeId>,
}

///
/// CompositeOrderBuilder
///
/// Accumulates `order by` / `then by` clauses in precedence order.
///
/// Each `order by` starts a new run at the front of the chain; each
/// `then by` extends the most recent run in place. So
/// `order A, then B, order C, then D` resolves to `C, D, A, B`: runs stay
/// contiguous, the newest run dominates, and older runs keep the order
/// they were issued in behind it.
///
/// Clauses live in an arena-backed singly linked list so both insertion
/// points (front, and after the cursor) are O(1).
///

pub struct CompositeOrderBuilder<T> {
    nodes: Vec<ClauseNode<T>>,
    head: Option<NodeId>,
    // Tail of the active run; `None` until the first `order by`.
    cursor: Option<NodeId>,
}

impl<T> CompositeOrderBuilder<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            cursor: None,
        }
    }

    /// Number of clauses in the chain.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` once an `order by` has been issued, i.e. `then by` is allowed.
    #[must_use]
    pub const fn has_primary(&self) -> bool {
        self.cursor.is_some()
    }

    /// Clauses in precedence order, most dominant first.
    #[must_use]
    pub fn clauses(&self) -> Clauses<'_, T> {
        Clauses {
            nodes: &self.nodes,
            next: self.head,
            remaining: self.nodes.len(),
        }
    }

    /// Field labels in precedence order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.clauses().map(OrderClause::field)
    }

    /// Insert one clause.
    ///
    /// A new primary clause goes to the front of the chain and becomes the
    /// cursor. Otherwise the clause is linked directly after the cursor and
    /// the cursor advances to it.
    pub fn push_clause(
        &mut self,
        clause: OrderClause<T>,
        is_new_primary: bool,
    ) -> Result<(), OrderError> {
        if is_new_primary {
            self.link_front(clause);
            return Ok(());
        }

        let Some(cursor) = self.cursor else {
            warn!(field = clause.field(), "then-by rejected: no primary order clause");
            return Err(OrderError::InvalidSequence);
        };
        self.link_after(cursor, clause);

        Ok(())
    }

    /// Insert one clause from possibly-absent parts.
    ///
    /// Missing parts are rejected before any state is touched.
    pub fn add_clause(
        &mut self,
        field: impl Into<String>,
        selector: Option<KeySelector<T>>,
        comparer: Option<KeyComparer>,
        is_new_primary: bool,
    ) -> Result<(), OrderError>
    where
        T: 'static,
    {
        let clause = OrderClause::try_new(field, selector, comparer)?;

        self.push_clause(clause, is_new_primary)
    }

    /// Project one row into its composite key, one slot per clause.
    pub fn project(&self, row: &T) -> Result<CompositeKey, OrderError> {
        self.clauses().map(|clause| clause.select(row)).collect()
    }

    /// Lexicographic comparison of two keys projected by this builder.
    #[must_use]
    pub fn compare(&self, left: &CompositeKey, right: &CompositeKey) -> Ordering {
        debug_assert_eq!(
            left.len(),
            self.len(),
            "composite key arity must match clause count",
        );
        debug_assert_eq!(
            right.len(),
            self.len(),
            "composite key arity must match clause count",
        );

        for ((clause, left), right) in self.clauses().zip(left.iter()).zip(right.iter()) {
            let ordering = clause.compare(left, right);

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }

    fn link_front(&mut self, clause: OrderClause<T>) {
        let id = self.nodes.len();

        self.nodes.push(ClauseNode {
            clause,
            next: self.head,
        });
        self.head = Some(id);
        self.cursor = Some(id);

        self.trace_insert(id, true);
    }

    fn link_after(&mut self, cursor: NodeId, clause: OrderClause<T>) {
        let id = self.nodes.len();
        let next = self.nodes[cursor].next;

        self.nodes.push(ClauseNode { clause, next });
        self.nodes[cursor].next = Some(id);
        self.cursor = Some(id);

        self.trace_insert(id, false);
    }

    fn trace_insert(&self, id: NodeId, primary: bool) {
        debug!(
            field = self.nodes[id].clause.field(),
            primary,
            clauses = self.nodes.len(),
            "order clause added"
        );
    }

    // Copy the chain in precedence order into a fresh compact arena.
    // The new cursor is the node emitted while visiting the source cursor.
    fn rebuild<U>(
        &self,
        map: impl Fn(&OrderClause<T>) -> OrderClause<U>,
    ) -> CompositeOrderBuilder<U> {
        let mut nodes: Vec<ClauseNode<U>> = Vec::with_capacity(self.nodes.len());
        let mut cursor = None;
        let mut next = self.head;

        while let Some(id) = next {
            let node = &self.nodes[id];
            let new_id = nodes.len();

            if self.cursor == Some(id) {
                cursor = Some(new_id);
            }
            if let Some(prev) = nodes.last_mut() {
                prev.next = Some(new_id);
            }

            nodes.push(ClauseNode {
                clause: map(&node.clause),
                next: None,
            });
            next = node.next;
        }

        CompositeOrderBuilder {
            head: if nodes.is_empty() { None } else { Some(0) },
            nodes,
            cursor,
        }
    }
}

impl<T: 'static> CompositeOrderBuilder<T> {
    /// Start a new primary run ordered by the key's natural `Ord`, ascending.
    pub fn order_by<K, F>(&mut self, field: impl Into<String>, key: F) -> &mut Self
    where
        K: Ord + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.insert_primary(OrderClause::natural(field, key, OrderDirection::Asc))
    }

    pub fn order_by_desc<K, F>(&mut self, field: impl Into<String>, key: F) -> &mut Self
    where
        K: Ord + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.insert_primary(OrderClause::natural(field, key, OrderDirection::Desc))
    }

    /// Start a new primary run with a caller-supplied key comparison.
    pub fn order_by_with<K, F, C>(
        &mut self,
        field: impl Into<String>,
        key: F,
        cmp: C,
        direction: OrderDirection,
    ) -> &mut Self
    where
        K: Any + Send + Sync,
        F: Fn(&T) -> K + Send + Sync + 'static,
        C: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        self.insert_primary(OrderClause::with_comparer(field, key, cmp, direction))
    }

    /// Extend the active run, ascending.
    pub fn then_by<K, F>(
        &mut self,
        field: impl Into<String>,
        key: F,
    ) -> Result<&mut Self, OrderError>
    where
        K: Ord + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.push_clause(OrderClause::natural(field, key, OrderDirection::Asc), false)?;

        Ok(self)
    }

    pub fn then_by_desc<K, F>(
        &mut self,
        field: impl Into<String>,
        key: F,
    ) -> Result<&mut Self, OrderError>
    where
        K: Ord + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.push_clause(OrderClause::natural(field, key, OrderDirection::Desc), false)?;

        Ok(self)
    }

    pub fn then_by_with<K, F, C>(
        &mut self,
        field: impl Into<String>,
        key: F,
        cmp: C,
        direction: OrderDirection,
    ) -> Result<&mut Self, OrderError>
    where
        K: Any + Send + Sync,
        F: Fn(&T) -> K + Send + Sync + 'static,
        C: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        self.push_clause(OrderClause::with_comparer(field, key, cmp, direction), false)?;

        Ok(self)
    }

    /// Fork this chain for rows of type `U` that can be viewed as `T`.
    ///
    /// Selectors run against the `T` view of each row and fail with
    /// `TypeMismatch` when `cast` rejects a row. Comparers are shared as-is;
    /// they only ever see projected keys, never rows.
    #[must_use]
    pub fn clone_cast<U, F>(&self, cast: F) -> CompositeOrderBuilder<U>
    where
        U: 'static,
        F: for<'a> Fn(&'a U) -> Option<&'a T> + Send + Sync + 'static,
    {
        let cast: RowCast<U, T> = Arc::new(cast);
        let forked = self.rebuild(|clause| clause.cast(Arc::clone(&cast)));

        debug!(
            from = std::any::type_name::<T>(),
            to = std::any::type_name::<U>(),
            clauses = forked.len(),
            "order chain cast-cloned"
        );

        forked
    }

    /// Fork this chain for type-erased rows, downcasting each row to `T`.
    #[must_use]
    pub fn clone_cast_any(&self) -> CompositeOrderBuilder<AnyRow> {
        self.clone_cast::<AnyRow, _>(|row: &AnyRow| (**row).downcast_ref::<T>())
    }

    fn insert_primary(&mut self, clause: OrderClause<T>) -> &mut Self {
        self.link_front(clause);

        self
    }
}

impl<T> Clone for CompositeOrderBuilder<T> {
    fn clone(&self) -> Self {
        let forked = self.rebuild(OrderClause::clone);
        trace!(clauses = forked.len(), "order chain cloned");

        forked
    }
}

impl<T> Default for CompositeOrderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CompositeOrderBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cursor = self.cursor.map(|id| self.nodes[id].clause.field());

        f.debug_struct("CompositeOrderBuilder")
            .field("fields", &self.fields().collect::<Vec<_>>())
            .field("cursor", &cursor)
            .finish()
    }
}

///
/// Clauses
///
/// Iterator over a builder's clauses in precedence order.
///

pub struct Clauses<'a, T> {
    nodes: &'a [ClauseNode<T>],
    next: Option<NodeId>,
    remaining: usize,
}

impl<'a, T> Iterator for Clauses<'a, T> {
    type Item = &'a OrderClause<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.nodes[self.next?];
        self.next = node.next;
        self.remaining -= 1;

        Some(&node.clause)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Clauses<'_, T> {}

impl<T> FusedIterator for Clauses<'_, T> {}
