//! Distribution of a [`Contract`] area across [`Unit`]s.
//!
//! [`Contract`]: crate::domain::Contract

use std::{collections::BTreeMap, str::FromStr};

use common::Area;
use derive_more::{Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

use crate::domain::{block, contract, unit, Unit};

/// Contracted [`Area`] allocated to a single [`Unit`].
///
/// All the [`Entry`]s of a [`Contract`] form its distribution plan.
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// ID of the [`Contract`] this [`Entry`] belongs to.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// ID of the [`Unit`] the [`Area`] is allocated to.
    pub unit_id: unit::Id,

    /// Name of the [`Block`] the [`Unit`] is located in.
    ///
    /// [`Block`]: crate::domain::Block
    pub block_name: block::Name,

    /// Floor the [`Unit`] is located on.
    pub floor: unit::Floor,

    /// Allocated [`Area`].
    pub area: Area,

    /// [`Coefficient`] of the allocated [`Area`].
    pub coefficient: Coefficient,
}

/// Positive multiplier of an [`Entry`] area, `1` by default.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Coefficient(Decimal);

impl Coefficient {
    /// Creates a new [`Coefficient`] if the provided value is positive.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (val > Decimal::ZERO).then_some(Self(val))
    }

    /// Returns the underlying [`Decimal`] value.
    #[must_use]
    pub fn decimal(self) -> Decimal {
        self.0
    }
}

impl FromStr for Coefficient {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Coefficient`")
    }
}

impl Default for Coefficient {
    fn default() -> Self {
        Self(Decimal::ONE)
    }
}

/// Proposed (not persisted) distribution of a single floor.
#[derive(Clone, Debug)]
pub struct Proposal {
    /// Floor being distributed.
    pub floor: unit::Floor,

    /// Contracted [`Area`] of the floor.
    pub floor_area: Area,

    /// Proposed [`Allocation`]s: apartments first, then halls.
    pub allocations: Vec<Allocation>,
}

impl Proposal {
    /// Distributes the `floor_area` equally across the provided
    /// `apartments`.
    ///
    /// If `hall` is provided, its [`Area`] is taken from the floor first and
    /// split equally across the hall [`Unit`]s, so that a single hall gets
    /// the whole hall [`Area`].
    ///
    /// # Errors
    ///
    /// - If there are no `apartments`.
    /// - If the hall [`Area`] is greater than the `floor_area`.
    /// - If the hall [`Area`] is provided but there are no hall [`Unit`]s.
    pub fn equal_shares(
        floor: unit::Floor,
        floor_area: Area,
        apartments: &[Unit],
        hall: Option<(Area, &[Unit])>,
    ) -> Result<Self, ProposalError> {
        use ProposalError as E;

        let mut available = floor_area;
        let mut halls = Vec::new();
        if let Some((hall_area, hall_units)) = hall {
            available = floor_area.checked_sub(hall_area).ok_or(
                E::HallExceedsFloor {
                    hall: hall_area,
                    floor: floor_area,
                },
            )?;
            let share = hall_area.share(hall_units.len()).ok_or(E::NoHall)?;
            halls = hall_units
                .iter()
                .map(|u| Allocation::new(u, share))
                .collect();
        }

        let share = available.share(apartments.len()).ok_or(E::NoApartments)?;
        let mut allocations = apartments
            .iter()
            .map(|u| Allocation::new(u, share))
            .collect::<Vec<_>>();
        allocations.append(&mut halls);

        Ok(Self {
            floor,
            floor_area,
            allocations,
        })
    }

    /// Returns the sum of all the allocated [`Area`]s.
    #[must_use]
    pub fn allocated(&self) -> Area {
        self.allocations.iter().map(|a| a.area).sum()
    }
}

/// [`Area`] proposed for a single [`Unit`].
#[derive(Clone, Debug)]
pub struct Allocation {
    /// ID of the [`Unit`].
    pub unit_id: unit::Id,

    /// Name of the [`Block`] the [`Unit`] is located in.
    ///
    /// [`Block`]: crate::domain::Block
    pub block_name: block::Name,

    /// [`unit::Label`] of the [`Unit`].
    pub label: unit::Label,

    /// [`unit::Kind`] of the [`Unit`].
    pub kind: unit::Kind,

    /// Proposed [`Area`].
    pub area: Area,
}

impl Allocation {
    /// Allocates the provided [`Area`] to the provided [`Unit`].
    fn new(unit: &Unit, area: Area) -> Self {
        Self {
            unit_id: unit.id,
            block_name: unit.block_name.clone(),
            label: unit.label.clone(),
            kind: unit.kind,
            area,
        }
    }
}

/// Error of making a [`Proposal`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ProposalError {
    /// Hall [`Area`] doesn't fit into the floor [`Area`].
    #[display("hall area {hall} exceeds floor area {floor}")]
    HallExceedsFloor {
        /// Requested hall [`Area`].
        hall: Area,

        /// Contracted floor [`Area`].
        floor: Area,
    },

    /// No apartment [`Unit`]s on the floor.
    #[display("no apartments on the floor")]
    NoApartments,

    /// No hall [`Unit`]s on the floor.
    #[display("no halls on the floor")]
    NoHall,
}

/// Reason a distribution plan is rejected.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Violation {
    /// Floor has no contracted [`Area`].
    #[display("floor {_0} is not contracted")]
    FloorNotContracted(unit::Floor),

    /// Sum of a floor [`Entry`]s diverges from the contracted [`Area`].
    #[display("floor {floor} sums to {actual} instead of {expected}")]
    FloorSumMismatch {
        /// Floor of the [`Entry`]s.
        floor: unit::Floor,

        /// Contracted [`Area`] of the floor.
        expected: Area,

        /// Sum of the [`Entry`]s [`Area`]s.
        actual: Area,
    },
}

/// Checks the provided plan `entries` against the contracted `floors`.
///
/// A plan covers the whole [`Contract`]: the [`Entry`]s of every contracted
/// floor must sum to its [`Area`] within the provided `tolerance`, so a
/// contracted floor without any [`Entry`] is only accepted if its [`Area`] is
/// zero. [`Entry`]s on floors that aren't contracted are not allowed.
///
/// # Errors
///
/// With all the found [`Violation`]s, ordered by floor.
///
/// [`Contract`]: crate::domain::Contract
pub fn check_plan(
    entries: &[Entry],
    floors: &contract::AreaByFloor,
    tolerance: Decimal,
) -> Result<(), Vec<Violation>> {
    let mut sums = floors
        .iter()
        .map(|(floor, _)| (floor, Area::ZERO))
        .collect::<BTreeMap<unit::Floor, Area>>();
    for e in entries {
        *sums.entry(e.floor).or_default() += e.area;
    }

    let violations = sums
        .into_iter()
        .filter_map(|(floor, actual)| match floors.get(floor) {
            None => Some(Violation::FloorNotContracted(floor)),
            Some(expected) if !expected.approx_eq(actual, tolerance) => {
                Some(Violation::FloorSumMismatch {
                    floor,
                    expected,
                    actual,
                })
            }
            Some(_) => None,
        })
        .collect::<Vec<_>>();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Area, DateTime};
    use rust_decimal::Decimal;

    use crate::domain::{
        block,
        contract::{self, AreaByFloor},
        development, unit, Unit,
    };

    use super::{
        check_plan, Coefficient, Entry, Proposal, ProposalError, Violation,
    };

    fn area(s: &str) -> Area {
        Area::from_str(s).unwrap()
    }

    fn unit(floor: unit::Floor, label: &str, kind: unit::Kind) -> Unit {
        Unit {
            id: unit::Id::new(),
            development_id: development::Id::default(),
            block_id: block::Id::default(),
            block_name: block::Name::numbered(1),
            floor,
            label: unit::Label::new(label).unwrap(),
            kind,
            typology: None,
            total_area: None,
            notes: None,
            created_at: DateTime::now().coerce(),
        }
    }

    fn apartments(floor: unit::Floor, n: u16) -> Vec<Unit> {
        (1..=n)
            .map(|seq| {
                unit(floor, &format!("{floor}{seq:02}"), unit::Kind::Apartment)
            })
            .collect()
    }

    fn entry(floor: unit::Floor, a: &str) -> Entry {
        Entry {
            contract_id: contract::Id::default(),
            unit_id: unit::Id::new(),
            block_name: block::Name::numbered(1),
            floor,
            area: area(a),
            coefficient: Coefficient::default(),
        }
    }

    #[test]
    fn shares_floor_equally() {
        let proposal =
            Proposal::equal_shares(1, area("300"), &apartments(1, 3), None)
                .unwrap();

        assert_eq!(proposal.allocations.len(), 3);
        assert!(proposal.allocations.iter().all(|a| a.area == area("100")));
        assert_eq!(proposal.allocated(), area("300"));
    }

    #[test]
    fn keeps_precision_of_uneven_shares() {
        let proposal =
            Proposal::equal_shares(2, area("100"), &apartments(2, 3), None)
                .unwrap();

        let first = proposal.allocations[0].area;
        assert_eq!(first.rounded(), Decimal::from_str("33.33").unwrap());
        assert!(proposal
            .allocated()
            .approx_eq(area("100"), Decimal::new(1, 2)));
    }

    #[test]
    fn reserves_hall_area() {
        let halls = [unit(1, "Hall", unit::Kind::Hall)];
        let proposal = Proposal::equal_shares(
            1,
            area("320"),
            &apartments(1, 4),
            Some((area("20"), &halls)),
        )
        .unwrap();

        assert_eq!(proposal.allocations.len(), 5);
        assert!(proposal.allocations[..4].iter().all(|a| a.area == area("75")));
        let hall = &proposal.allocations[4];
        assert_eq!(hall.kind, unit::Kind::Hall);
        assert_eq!(hall.area, area("20"));
        assert_eq!(proposal.allocated(), area("320"));
    }

    #[test]
    fn splits_hall_area_across_blocks() {
        let halls = [
            unit(3, "Hall", unit::Kind::Hall),
            unit(3, "Hall", unit::Kind::Hall),
        ];
        let proposal = Proposal::equal_shares(
            3,
            area("100"),
            &apartments(3, 2),
            Some((area("10"), &halls)),
        )
        .unwrap();

        assert_eq!(proposal.allocations[2].area, area("5"));
        assert_eq!(proposal.allocations[3].area, area("5"));
        assert_eq!(proposal.allocations[0].area, area("45"));
    }

    #[test]
    fn fails_without_units() {
        assert!(matches!(
            Proposal::equal_shares(1, area("10"), &[], None),
            Err(ProposalError::NoApartments),
        ));
        assert!(matches!(
            Proposal::equal_shares(
                1,
                area("10"),
                &apartments(1, 2),
                Some((area("2"), &[])),
            ),
            Err(ProposalError::NoHall),
        ));
    }

    #[test]
    fn fails_when_hall_exceeds_floor() {
        let halls = [unit(1, "Hall", unit::Kind::Hall)];

        assert!(matches!(
            Proposal::equal_shares(
                1,
                area("10"),
                &apartments(1, 2),
                Some((area("11"), &halls)),
            ),
            Err(ProposalError::HallExceedsFloor { .. }),
        ));
    }

    #[test]
    fn parses_positive_coefficient() {
        assert_eq!(
            Coefficient::from_str("1.25").unwrap().decimal(),
            Decimal::new(125, 2),
        );
        assert!(Coefficient::from_str("0").is_err());
        assert!(Coefficient::from_str("-1").is_err());
        assert!(Coefficient::from_str("one").is_err());
    }

    #[test]
    fn accepts_plan_within_tolerance() {
        let floors =
            AreaByFloor::new([(1, area("100")), (2, area("50"))]).unwrap();
        let entries = [
            entry(1, "33.333"),
            entry(1, "33.333"),
            entry(1, "33.333"),
            entry(2, "50"),
        ];

        assert_eq!(check_plan(&entries, &floors, Decimal::new(1, 2)), Ok(()));
    }

    #[test]
    fn requires_every_contracted_floor() {
        let floors = AreaByFloor::new([
            (1, area("100")),
            (2, area("100")),
            (3, Area::ZERO),
        ])
        .unwrap();
        let entries = [entry(1, "50"), entry(1, "50")];

        assert_eq!(
            check_plan(&entries, &floors, Decimal::new(1, 2)),
            Err(vec![Violation::FloorSumMismatch {
                floor: 2,
                expected: area("100"),
                actual: Area::ZERO,
            }]),
        );
    }

    #[test]
    fn reports_every_violation() {
        let floors =
            AreaByFloor::new([(1, area("100")), (2, area("50"))]).unwrap();
        let entries = [
            entry(1, "60"),
            entry(1, "30"),
            entry(2, "50"),
            entry(7, "10"),
        ];

        assert_eq!(
            check_plan(&entries, &floors, Decimal::new(1, 2)),
            Err(vec![
                Violation::FloorSumMismatch {
                    floor: 1,
                    expected: area("100"),
                    actual: area("90"),
                },
                Violation::FloorNotContracted(7),
            ]),
        );
    }
}
