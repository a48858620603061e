//! [`Development`]-related read definitions.

#[cfg(doc)]
use crate::domain::Development;

/// Filter of a [`Development`] list, ordered by name.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Filter {
    /// Whether only active [`Development`]s should be listed.
    pub active_only: bool,
}
