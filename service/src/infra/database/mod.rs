//! [`Database`]-related implementations.

#[cfg(test)]
pub(crate) mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    #[cfg(test)]
    /// Failure injected by a test [`Database`].
    #[display("injected failure: {_0}")]
    #[from(ignore)]
    Injected(#[error(not(source))] &'static str),

    #[cfg(test)]
    /// Unique constraint violation reported by a test [`Database`].
    #[display("`{_0}` constraint is violated")]
    #[from(ignore)]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if this [`Error`] is a unique violation of the specified
    /// constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
            #[cfg(test)]
            Self::Injected(_) => false,
            #[cfg(test)]
            Self::UniqueViolation(name) => {
                constraint.map_or(true, |c| c == *name)
            }
        }
    }
}
