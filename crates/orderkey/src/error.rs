use thiserror::Error as ThisError;

///
/// OrderError
///
/// Failures raised while composing or applying an ordering chain.
/// All of them are reported at the point of misuse; a failed call never
/// leaves a builder partially mutated.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum OrderError {
    /// A key selector or comparer was not supplied.
    #[error("order clause is missing its {argument}")]
    NullArgument { argument: &'static str },

    /// `then by` was issued before any `order by` established a primary clause.
    #[error("then-by requires a preceding order-by")]
    InvalidSequence,

    /// A row handed to a cast-cloned clause could not be viewed as the row
    /// type the clause was built for.
    #[error("row type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl OrderError {
    /// Construct a type mismatch between two row types.
    pub(crate) fn type_mismatch<Expected: ?Sized, Found: ?Sized>() -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<Expected>(),
            found: std::any::type_name::<Found>(),
        }
    }
}
