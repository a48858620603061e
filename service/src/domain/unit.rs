//! [`Unit`] definitions.

use common::{define_kind, define_text, marker, Area, DateTime, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Block, Development};
use crate::domain::{block, development, Notes};

/// Addressable piece of a [`Block`] floor: an apartment or a hall.
#[derive(Clone, Debug)]
pub struct Unit {
    /// ID of this [`Unit`].
    pub id: Id,

    /// ID of the [`Development`] this [`Unit`] belongs to.
    pub development_id: development::Id,

    /// ID of the [`Block`] this [`Unit`] belongs to.
    pub block_id: block::Id,

    /// Name of the [`Block`] this [`Unit`] belongs to.
    pub block_name: block::Name,

    /// [`Floor`] this [`Unit`] is located on.
    pub floor: Floor,

    /// [`Label`] of this [`Unit`], unique on its [`Floor`].
    pub label: Label,

    /// [`Kind`] of this [`Unit`].
    pub kind: Kind,

    /// [`Typology`] of this [`Unit`], if known.
    pub typology: Option<Typology>,

    /// Total floor [`Area`] of this [`Unit`], if known.
    pub total_area: Option<Area>,

    /// [`Notes`] about this [`Unit`], if any.
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Unit`] was created.
    pub created_at: CreationDateTime,
}

impl Unit {
    /// Creates a new [`Unit`] occupying the provided [`Slot`] of a [`Block`].
    #[must_use]
    pub fn in_slot(block: &block::Block, slot: Slot) -> Self {
        let Slot { floor, label, kind } = slot;
        Self {
            id: Id::new(),
            development_id: block.development_id,
            block_id: block.id,
            block_name: block.name.clone(),
            floor,
            label,
            kind,
            typology: None,
            total_area: None,
            notes: None,
            created_at: DateTime::now().coerce(),
        }
    }

    /// Returns the [`Address`] of this [`Unit`].
    #[must_use]
    pub fn address(&self) -> Address<'_> {
        Address {
            block_name: &self.block_name,
            floor: self.floor,
            label: &self.label,
        }
    }
}

/// ID of a [`Unit`].
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

/// Floor number, starting from `1`.
pub type Floor = u16;

define_text! {
    #[doc = "Label of a [`Unit`] on its floor, like `302` or `Hall`."]
    struct Label(max_len = 32);
}

define_text! {
    #[doc = "Typology of a [`Unit`], like `2 bedrooms`."]
    struct Typology(max_len = 128);
}

define_kind! {
    #[doc = "Kind of a [`Unit`]."]
    enum Kind {
        #[doc = "Private apartment."]
        Apartment = 1,

        #[doc = "Common hall of a floor."]
        Hall = 2,
    }
}

/// Position of a [`Unit`] inside its [`Development`], unique across it
/// together with the [`Development`] ID.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Address<'a> {
    /// Name of the [`Block`].
    pub block_name: &'a block::Name,

    /// [`Floor`] in the [`Block`].
    pub floor: Floor,

    /// [`Label`] on the [`Floor`].
    pub label: &'a Label,
}

/// [`Unit`] position generated from a [`block::Layout`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Slot {
    /// [`Floor`] of the [`Slot`].
    pub floor: Floor,

    /// [`Label`] of the [`Slot`].
    pub label: Label,

    /// [`Kind`] of the [`Unit`] occupying the [`Slot`].
    pub kind: Kind,
}

impl Slot {
    /// Creates a new [`Slot`].
    ///
    /// # Panics
    ///
    /// If the provided `label` is not a valid [`Label`].
    #[must_use]
    pub(crate) fn new(floor: Floor, label: String, kind: Kind) -> Self {
        Self {
            floor,
            label: Label::new(label).expect("generated `Label` is valid"),
            kind,
        }
    }
}

/// [`DateTime`] when a [`Unit`] was created.
pub type CreationDateTime = DateTimeOf<(Unit, marker::Creation)>;
