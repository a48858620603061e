//! [`Execution`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_text, marker, Area, Date, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Contract, Unit};
use crate::domain::{contract, unit, Notes};

/// Measurement of the [`Area`] executed in a [`Unit`] under a [`Contract`].
///
/// Once recorded, an [`Execution`] is never changed, except for being
/// [`Approval`]ed once.
#[derive(Clone, Debug)]
pub struct Execution {
    /// ID of this [`Execution`].
    pub id: Id,

    /// ID of the [`Contract`] this [`Execution`] is made under.
    pub contract_id: contract::Id,

    /// ID of the [`Unit`] this [`Execution`] is made in.
    pub unit_id: unit::Id,

    /// Executed [`Area`], always positive.
    pub area: Area,

    /// [`Date`] when the executed [`Area`] was measured.
    pub measured_on: Date,

    /// [`Responsible`] for this [`Execution`].
    pub responsible: Responsible,

    /// [`Notes`] about this [`Execution`], if any.
    pub notes: Option<Notes>,

    /// [`Approval`] of this [`Execution`], if approved.
    pub approval: Option<Approval>,

    /// [`DateTime`] when this [`Execution`] was recorded.
    pub created_at: CreationDateTime,
}

impl Execution {
    /// Indicates whether this [`Execution`] is approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.approval.is_some()
    }
}

/// ID of an [`Execution`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Person or team responsible for an [`Execution`]."]
    struct Responsible(max_len = 256);
}

define_text! {
    #[doc = "Person who approved an [`Execution`]."]
    struct Approver(max_len = 256);
}

/// Approval of an [`Execution`].
#[derive(Clone, Debug)]
pub struct Approval {
    /// [`Approver`] of the [`Execution`].
    pub approver: Approver,

    /// [`DateTime`] when the [`Execution`] was approved.
    pub approved_at: ApprovalDateTime,
}

/// [`DateTime`] when an [`Execution`] was recorded.
pub type CreationDateTime = DateTimeOf<(Execution, marker::Creation)>;

/// [`DateTime`] when an [`Execution`] was approved.
pub type ApprovalDateTime = DateTimeOf<(Execution, marker::Approval)>;
