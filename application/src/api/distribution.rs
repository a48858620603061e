//! Distribution plan related definitions.

use common::Area;
use derive_more::{AsRef, Display, From, Into};
use juniper::{GraphQLInputObject, GraphQLObject, GraphQLScalar};
use service::{command::save_distribution::NewEntry, domain, read};

use crate::api::{self, scalar};

/// Positive multiplier of a distributed area, `1` by default.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DistributionCoefficient",
    with = scalar::Via::<domain::distribution::Coefficient>,
)]
pub struct Coefficient(domain::distribution::Coefficient);

/// Equal-share distribution proposed for a single floor, not persisted.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "DistributionProposal")]
pub struct Proposal {
    /// Distributed floor.
    pub floor: i32,

    /// Contracted area of the floor.
    pub floor_area: Area,

    /// Proposed allocations: apartments first, then halls.
    pub allocations: Vec<Allocation>,

    /// Sum of all the allocated areas.
    ///
    /// May differ from `floorArea` by a rounding error.
    pub allocated: Area,
}

impl From<domain::distribution::Proposal> for Proposal {
    fn from(proposal: domain::distribution::Proposal) -> Self {
        let allocated = proposal.allocated();
        let domain::distribution::Proposal {
            floor,
            floor_area,
            allocations,
        } = proposal;
        Self {
            floor: floor.into(),
            floor_area,
            allocations: allocations.into_iter().map(Into::into).collect(),
            allocated,
        }
    }
}

/// Area proposed for a single `Unit`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "DistributionAllocation")]
pub struct Allocation {
    /// ID of the `Unit`.
    pub unit_id: api::unit::Id,

    /// Name of the `Block` the `Unit` is located in.
    pub block_name: api::block::Name,

    /// Label of the `Unit`.
    pub label: api::unit::Label,

    /// Kind of the `Unit`.
    pub kind: api::unit::Kind,

    /// Proposed area.
    pub area: Area,
}

impl From<domain::distribution::Allocation> for Allocation {
    fn from(allocation: domain::distribution::Allocation) -> Self {
        let domain::distribution::Allocation {
            unit_id,
            block_name,
            label,
            kind,
            area,
        } = allocation;
        Self {
            unit_id: unit_id.into(),
            block_name: block_name.into(),
            label: label.into(),
            kind: kind.into(),
            area,
        }
    }
}

/// Saved allocation of a `Contract` area to a single `Unit`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "DistributionLine")]
pub struct Line {
    /// ID of the `Unit`.
    pub unit_id: api::unit::Id,

    /// Name of the `Block` the `Unit` is located in.
    pub block_name: api::block::Name,

    /// Floor the `Unit` is located on.
    pub floor: i32,

    /// Label of the `Unit`.
    pub label: api::unit::Label,

    /// Kind of the `Unit`.
    pub kind: api::unit::Kind,

    /// Allocated area.
    pub area: Area,

    /// Coefficient of the allocated area.
    pub coefficient: Coefficient,
}

impl From<read::distribution::Line> for Line {
    fn from(line: read::distribution::Line) -> Self {
        let read::distribution::Line {
            entry,
            unit_label,
            unit_kind,
        } = line;
        Self {
            unit_id: entry.unit_id.into(),
            block_name: entry.block_name.into(),
            floor: entry.floor.into(),
            label: unit_label.into(),
            kind: unit_kind.into(),
            area: entry.area,
            coefficient: entry.coefficient.into(),
        }
    }
}

/// Allocation of a `Contract` area to a single `Unit`.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "DistributionEntryInput")]
pub struct EntryInput {
    /// ID of the `Unit`.
    pub unit_id: api::unit::Id,

    /// Allocated area.
    pub area: Area,

    /// Coefficient of the allocated area, `1` if omitted.
    pub coefficient: Option<Coefficient>,
}

impl From<EntryInput> for NewEntry {
    fn from(input: EntryInput) -> Self {
        let EntryInput {
            unit_id,
            area,
            coefficient,
        } = input;
        Self {
            unit_id: unit_id.into(),
            area,
            coefficient: coefficient.map(Into::into),
        }
    }
}
