//! [`Block`] definitions.

use std::collections::HashSet;

use common::define_text;
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{development, unit, Unit};

/// Building (tower) of a [`Development`].
///
/// [`Development`]: crate::domain::Development
#[derive(Clone, Debug)]
pub struct Block {
    /// ID of this [`Block`].
    pub id: Id,

    /// ID of the [`Development`] this [`Block`] belongs to.
    ///
    /// [`Development`]: crate::domain::Development
    pub development_id: development::Id,

    /// [`Name`] of this [`Block`], unique within its [`Development`].
    ///
    /// [`Development`]: crate::domain::Development
    pub name: Name,

    /// [`Layout`] of this [`Block`].
    pub layout: Layout,
}

/// ID of a [`Block`].
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
    #[doc = "Name of a [`Block`]."]
    struct Name(max_len = 64);
}

impl Name {
    /// Creates a [`Name`] for the `n`th [`Block`] of a `Development`, like
    /// `Block 01`.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn numbered(n: usize) -> Self {
        Self::new(format!("Block {n:02}")).expect("infallible")
    }
}

/// Shape of a [`Block`] used to generate its [`Unit`]s.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Layout {
    /// Number of floors in a [`Block`].
    floor_count: u16,

    /// Number of apartment [`Unit`]s on each floor.
    units_per_floor: u16,

    /// Number of hall [`Unit`]s on each floor.
    ///
    /// Zero means the [`Block`] has no halls.
    halls_per_floor: u16,
}

impl Layout {
    /// Creates a new [`Layout`] out of the provided parameters.
    ///
    /// When `has_halls` is set, at least one hall per floor is assumed even
    /// if `halls_per_floor` is zero. When it's not, `halls_per_floor` is
    /// ignored.
    ///
    /// # Errors
    ///
    /// If `floor_count` or `units_per_floor` is zero.
    pub fn new(
        floor_count: u16,
        units_per_floor: u16,
        has_halls: bool,
        halls_per_floor: u16,
    ) -> Result<Self, LayoutError> {
        if floor_count == 0 {
            return Err(LayoutError::NoFloors);
        }
        if units_per_floor == 0 {
            return Err(LayoutError::NoUnitsPerFloor);
        }
        Ok(Self {
            floor_count,
            units_per_floor,
            halls_per_floor: if has_halls { halls_per_floor.max(1) } else { 0 },
        })
    }

    /// Returns the number of floors.
    #[must_use]
    pub fn floor_count(self) -> u16 {
        self.floor_count
    }

    /// Returns the number of apartments on each floor.
    #[must_use]
    pub fn units_per_floor(self) -> u16 {
        self.units_per_floor
    }

    /// Indicates whether floors have hall [`Unit`]s.
    #[must_use]
    pub fn has_halls(self) -> bool {
        self.halls_per_floor > 0
    }

    /// Returns the number of halls on each floor.
    #[must_use]
    pub fn halls_per_floor(self) -> u16 {
        self.halls_per_floor
    }

    /// Indicates whether the provided `floor` exists in this [`Layout`].
    #[must_use]
    pub fn contains_floor(self, floor: unit::Floor) -> bool {
        (1..=self.floor_count).contains(&floor)
    }

    /// Returns a predicate telling whether a [`Unit`] is left out when this
    /// [`Layout`] replaces the `previous` one.
    ///
    /// A [`Unit`] is left out if it's located above the last floor, or if it
    /// occupies a [`unit::Slot`] the `previous` [`Layout`] has and this one
    /// doesn't. Other [`Unit`]s, including manually created ones, stay.
    pub fn leaves_out(self, previous: Self) -> impl Fn(&Unit) -> bool {
        let kept = self
            .slots()
            .map(|s| (s.floor, s.label))
            .collect::<HashSet<_>>();
        let dropped = previous
            .slots()
            .map(|s| (s.floor, s.label))
            .filter(|slot| !kept.contains(slot))
            .collect::<HashSet<_>>();

        move |unit: &Unit| {
            !self.contains_floor(unit.floor)
                || dropped.contains(&(unit.floor, unit.label.clone()))
        }
    }

    /// Returns the total number of [`unit::Slot`]s in this [`Layout`].
    #[must_use]
    pub fn slot_count(self) -> usize {
        usize::from(self.floor_count)
            * (usize::from(self.units_per_floor)
                + usize::from(self.halls_per_floor))
    }

    /// Enumerates all the [`unit::Slot`]s of this [`Layout`], floor by floor.
    ///
    /// Apartments are labeled as `{floor}{seq:02}` (so the 2nd apartment on
    /// the 3rd floor is `302`). Halls are labeled `Hall` when there is only
    /// one per floor, and `Hall {n}` otherwise.
    pub fn slots(self) -> impl Iterator<Item = unit::Slot> {
        (1..=self.floor_count).flat_map(move |floor| {
            let apartments = (1..=self.units_per_floor).map(move |seq| {
                unit::Slot::new(
                    floor,
                    format!("{floor}{seq:02}"),
                    unit::Kind::Apartment,
                )
            });
            let halls = (1..=self.halls_per_floor).map(move |n| {
                let label = if self.halls_per_floor == 1 {
                    "Hall".to_owned()
                } else {
                    format!("Hall {n}")
                };
                unit::Slot::new(floor, label, unit::Kind::Hall)
            });
            apartments.chain(halls)
        })
    }
}

/// Error of creating an invalid [`Layout`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum LayoutError {
    /// [`Layout`] has no floors.
    #[display("`floor_count` must be positive")]
    NoFloors,

    /// [`Layout`] has no apartments on a floor.
    #[display("`units_per_floor` must be positive")]
    NoUnitsPerFloor,
}

#[cfg(test)]
mod spec {
    use crate::domain::{development, unit, Unit};

    use super::{Block, Id, Layout, LayoutError, Name};

    fn labels(layout: Layout, floor: unit::Floor) -> Vec<String> {
        layout
            .slots()
            .filter(|s| s.floor == floor)
            .map(|s| s.label.to_string())
            .collect()
    }

    #[test]
    fn rejects_empty_layout() {
        assert!(matches!(
            Layout::new(0, 4, false, 0),
            Err(LayoutError::NoFloors),
        ));
        assert!(matches!(
            Layout::new(10, 0, true, 1),
            Err(LayoutError::NoUnitsPerFloor),
        ));
    }

    #[test]
    fn generates_apartments_and_single_hall() {
        let layout = Layout::new(10, 4, true, 1).unwrap();

        let slots = layout.slots().collect::<Vec<_>>();
        assert_eq!(slots.len(), 50);
        assert_eq!(slots.len(), layout.slot_count());

        assert_eq!(labels(layout, 1), ["101", "102", "103", "104", "Hall"]);
        assert_eq!(
            labels(layout, 10),
            ["1001", "1002", "1003", "1004", "Hall"],
        );

        let halls = slots
            .iter()
            .filter(|s| s.kind == unit::Kind::Hall)
            .count();
        assert_eq!(halls, 10);
    }

    #[test]
    fn numbers_multiple_halls() {
        let layout = Layout::new(2, 1, true, 2).unwrap();

        assert_eq!(labels(layout, 2), ["201", "Hall 1", "Hall 2"]);
    }

    #[test]
    fn assumes_one_hall_when_enabled() {
        let layout = Layout::new(3, 2, true, 0).unwrap();

        assert_eq!(layout.halls_per_floor(), 1);
        assert_eq!(layout.slot_count(), 9);
    }

    #[test]
    fn ignores_halls_when_disabled() {
        let layout = Layout::new(3, 2, false, 5).unwrap();

        assert!(!layout.has_halls());
        assert!(layout.slots().all(|s| s.kind == unit::Kind::Apartment));
    }

    #[test]
    fn leaves_out_units_of_shrunk_layout() {
        let block = Block {
            id: Id::new(),
            development_id: development::Id::new(),
            name: Name::numbered(1),
            layout: Layout::new(3, 3, true, 1).unwrap(),
        };
        let mut units = block
            .layout
            .slots()
            .map(|slot| Unit::in_slot(&block, slot))
            .collect::<Vec<_>>();
        units.push(Unit::in_slot(
            &block,
            unit::Slot::new(2, "2A".into(), unit::Kind::Apartment),
        ));

        let shrunk = Layout::new(2, 2, false, 0).unwrap();
        let left_out = shrunk.leaves_out(block.layout);
        let mut labels = units
            .iter()
            .filter(|&u| left_out(u))
            .map(|u| format!("{}:{}", u.floor, u.label))
            .collect::<Vec<_>>();
        labels.sort();

        assert_eq!(
            labels,
            [
                "1:103", "1:Hall", "2:203", "2:Hall", "3:301", "3:302",
                "3:303", "3:Hall",
            ],
        );
    }

    #[test]
    fn keeps_units_of_grown_layout() {
        let block = Block {
            id: Id::new(),
            development_id: development::Id::new(),
            name: Name::numbered(1),
            layout: Layout::new(2, 2, false, 0).unwrap(),
        };
        let grown = Layout::new(4, 3, true, 1).unwrap();
        let left_out = grown.leaves_out(block.layout);

        assert!(!block
            .layout
            .slots()
            .map(|slot| Unit::in_slot(&block, slot))
            .any(|u| left_out(&u)));
    }

    #[test]
    fn names_numbered_blocks() {
        assert_eq!(Name::numbered(1).as_ref(), "Block 01");
        assert_eq!(Name::numbered(12).as_ref(), "Block 12");
    }
}
