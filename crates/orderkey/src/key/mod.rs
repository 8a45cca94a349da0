
use derive_more::{Deref, IntoIterator};
use std::{any::Any, cmp::Ordering, fmt, sync::Arc};

///
/// SortKey
///
/// One type-erased scalar produced by a clause's key selector.
/// Comparison is never dispatched on the runtime type; the clause that
/// produced the key owns the comparer that knows how to read it.
///

#[derive(Clone)]
pub struct SortKey {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl SortKey {
    #[must_use]
    pub fn new<K>(value: K) -> Self
    where
        K: Any + Send + Sync,
    {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<K>(),
        }
    }

    /// Borrow the key as `K`, if that is what it holds.
    #[must_use]
    pub fn downcast_ref<K: Any>(&self) -> Option<&K> {
        (*self.value).downcast_ref::<K>()
    }

    #[must_use]
    pub fn is<K: Any>(&self) -> bool {
        (*self.value).is::<K>()
    }

    /// Name of the concrete key type, for diagnostics only.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SortKey").field(&self.type_name).finish()
    }
}

///
/// CompositeKey
///
/// Projected ordering tuple for one row: one `SortKey` per clause,
/// in clause precedence order.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct CompositeKey(Vec<SortKey>);

impl CompositeKey {
    #[must_use]
    pub const fn from_vec(keys: Vec<SortKey>) -> Self {
        Self(keys)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<SortKey> {
        self.0
    }
}

impl FromIterator<SortKey> for CompositeKey {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// Compare two keys as `K` using the same slot semantics as query ordering:
// - a key that does not hold a `K` counts as missing
// - missing sorts lower than present, two missing keys tie
pub(crate) fn compare_typed<K, F>(left: &SortKey, right: &SortKey, cmp: F) -> Ordering
where
    K: Any,
    F: Fn(&K, &K) -> Ordering,
{
    match (left.downcast_ref::<K>(), right.downcast_ref::<K>()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => cmp(left, right),
    }
}
