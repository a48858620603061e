//! [`Development`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_text, marker, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Block;
use crate::domain::Notes;

/// Construction project made of one or more [`Block`]s.
#[derive(Clone, Debug)]
pub struct Development {
    /// ID of this [`Development`].
    pub id: Id,

    /// [`Name`] of this [`Development`].
    pub name: Name,

    /// [`Notes`] about this [`Development`], if any.
    pub notes: Option<Notes>,

    /// Indicator whether this [`Development`] is active.
    pub is_active: bool,

    /// [`DateTime`] when this [`Development`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Development`].
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
    Ord,
    PartialEq,
    PartialOrd,
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
    #[doc = "Name of a [`Development`]."]
    struct Name(max_len = 256);
}

/// [`DateTime`] when a [`Development`] was created.
pub type CreationDateTime = DateTimeOf<(Development, marker::Creation)>;
