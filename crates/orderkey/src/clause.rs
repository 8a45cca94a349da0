use crate::{
    direction::OrderDirection,
    error::OrderError,
    key::{SortKey, compare_typed},
};
use std::{any::Any, cmp::Ordering, fmt, sync::Arc};

/// Extracts one clause's sort key from a row.
///
/// Selectors built by the typed constructors never fail; only selectors
/// produced by cast-cloning can reject a row.
pub type KeySelector<T> = Arc<dyn Fn(&T) -> Result<SortKey, OrderError> + Send + Sync>;

/// Three-way comparison over two keys produced by the same clause,
/// already oriented for the clause's direction.
pub type KeyComparer = Arc<dyn Fn(&SortKey, &SortKey) -> Ordering + Send + Sync>;

/// Borrowing view of a row as another row type.
pub(crate) type RowCast<U, T> = Arc<dyn for<'a> Fn(&'a U) -> Option<&'a T> + Send + Sync>;

///
/// OrderClause
///
/// One `order by` / `then by` entry: a labelled selector plus the comparer
/// bound to the selector's key type at insertion time.
///

pub struct OrderClause<T> {
    field: String,
    selector: KeySelector<T>,
    comparer: KeyComparer,
}

impl<T: 'static> OrderClause<T> {
    #[must_use]
    pub fn new(field: impl Into<String>, selector: KeySelector<T>, comparer: KeyComparer) -> Self {
        Self {
            field: field.into(),
            selector,
            comparer,
        }
    }

    /// Build a clause from possibly-absent parts, rejecting missing ones.
    pub fn try_new(
        field: impl Into<String>,
        selector: Option<KeySelector<T>>,
        comparer: Option<KeyComparer>,
    ) -> Result<Self, OrderError> {
        let selector = selector.ok_or(OrderError::NullArgument {
            argument: "key selector",
        })?;
        let comparer = comparer.ok_or(OrderError::NullArgument {
            argument: "comparer",
        })?;

        Ok(Self::new(field, selector, comparer))
    }

    /// Clause ordered by the key's natural `Ord`.
    #[must_use]
    pub fn natural<K, F>(field: impl Into<String>, key: F, direction: OrderDirection) -> Self
    where
        K: Ord + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::with_comparer(field, key, K::cmp, direction)
    }

    /// Clause ordered by a caller-supplied comparison over typed keys.
    #[must_use]
    pub fn with_comparer<K, F, C>(
        field: impl Into<String>,
        key: F,
        cmp: C,
        direction: OrderDirection,
    ) -> Self
    where
        K: Any + Send + Sync,
        F: Fn(&T) -> K + Send + Sync + 'static,
        C: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        let selector: KeySelector<T> = Arc::new(move |row: &T| Ok(SortKey::new(key(row))));
        let comparer: KeyComparer = Arc::new(move |left: &SortKey, right: &SortKey| {
            direction.apply(compare_typed::<K, _>(left, right, &cmp))
        });

        Self::new(field, selector, comparer)
    }

    /// Rebind this clause to rows of type `U`, viewed as `T` through `cast`.
    /// The comparer is shared unchanged since it only ever sees keys.
    pub(crate) fn cast<U: 'static>(&self, cast: RowCast<U, T>) -> OrderClause<U> {
        let selector = Arc::clone(&self.selector);
        let cast_selector: KeySelector<U> = Arc::new(move |row: &U| match cast(row) {
            Some(row) => selector(row),
            None => Err(OrderError::type_mismatch::<T, U>()),
        });

        OrderClause {
            field: self.field.clone(),
            selector: cast_selector,
            comparer: Arc::clone(&self.comparer),
        }
    }
}

impl<T> OrderClause<T> {
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn select(&self, row: &T) -> Result<SortKey, OrderError> {
        (self.selector)(row)
    }

    #[must_use]
    pub fn compare(&self, left: &SortKey, right: &SortKey) -> Ordering {
        (self.comparer)(left, right)
    }
}

impl<T> Clone for OrderClause<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            selector: Arc::clone(&self.selector),
            comparer: Arc::clone(&self.comparer),
        }
    }
}

impl<T> fmt::Debug for OrderClause<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderClause")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}
