//! [`Unit`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Contract, Development, Unit};
use crate::domain::{contract, development, unit};

/// Selector of the [`Unit`]s of a specific [`unit::Kind`] on a floor across
/// all the blocks of a [`Development`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OnFloor {
    /// ID of the [`Development`].
    pub development_id: development::Id,

    /// Floor to select [`Unit`]s on.
    pub floor: unit::Floor,

    /// [`unit::Kind`] of the [`Unit`]s to select.
    pub kind: unit::Kind,
}

/// Indicator whether any of the [`Unit`]s has an execution recorded.
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct HasExecutions(pub bool);

/// Numbers of the [`Contract`]s whose distribution plans allocate area to
/// any of the [`Unit`]s.
///
/// Deleted [`Contract`]s are not included.
#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct DistributedIn(pub Vec<contract::Number>);
