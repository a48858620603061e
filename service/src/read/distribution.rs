//! Distribution-related read definitions.

use crate::domain::{distribution, unit};
#[cfg(doc)]
use crate::domain::{Contract, Unit};

/// [`distribution::Entry`] of a [`Contract`] plan joined with its [`Unit`].
///
/// Lines of a plan are ordered by block name, floor and [`Unit`] label.
#[derive(Clone, Debug)]
pub struct Line {
    /// Distribution [`distribution::Entry`].
    pub entry: distribution::Entry,

    /// [`unit::Label`] of the [`Unit`].
    pub unit_label: unit::Label,

    /// [`unit::Kind`] of the [`Unit`].
    pub unit_kind: unit::Kind,
}
