//! [`Contract`]-related read definitions.

use common::{Area, Percent};
use derive_more::{Deref, From, Into};

use crate::domain::{development, Contract};

/// Filter of a [`Contract`] list, ordered from the newest to the oldest.
///
/// Deleted [`Contract`]s are never listed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Filter {
    /// Whether only [`Status::Active`] [`Contract`]s should be listed.
    ///
    /// [`Status::Active`]: crate::domain::contract::Status::Active
    pub active_only: bool,
}

/// Sum of the executed [`Area`] recorded for a [`Contract`].
#[derive(Clone, Copy, Debug, Default, Deref, Eq, From, Into, PartialEq)]
pub struct ExecutedArea(pub Area);

/// [`Contract`] along with its progress.
#[derive(Clone, Debug)]
pub struct Details {
    /// The [`Contract`] itself.
    pub contract: Contract,

    /// Name of the [`Contract`]'s `Development`.
    pub development_name: development::Name,

    /// Sum of the executed [`Area`].
    pub executed_area: Area,

    /// Executed part of the [`Contract::total_area`].
    pub percent_executed: Percent,
}

impl Details {
    /// Combines the provided [`Contract`] with its progress.
    #[must_use]
    pub fn new(
        contract: Contract,
        development_name: development::Name,
        ExecutedArea(executed_area): ExecutedArea,
    ) -> Self {
        let percent_executed = Percent::of(executed_area, contract.total_area);
        Self {
            contract,
            development_name,
            executed_area,
            percent_executed,
        }
    }
}
