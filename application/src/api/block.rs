//! [`Block`]-related definitions.

use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLInputObject, GraphQLScalar};
use service::{command::create_development::NewBlock, domain};
use uuid::Uuid;

use crate::{api, api::scalar, define_error, Context, Error};

/// A building of a `Development`.
#[derive(Clone, Debug, From)]
pub struct Block(domain::Block);

/// A building (tower) of a `Development`.
#[graphql_object(context = Context)]
impl Block {
    /// Unique identifier of this `Block`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Block.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the `Development` this `Block` belongs to.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Block.developmentId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn development_id(&self) -> api::development::Id {
        self.0.development_id.into()
    }

    /// Name of this `Block`, unique within its `Development`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Block.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// Number of floors in this `Block`.
    pub fn floor_count(&self) -> i32 {
        self.0.layout.floor_count().into()
    }

    /// Number of apartments on each floor of this `Block`.
    pub fn units_per_floor(&self) -> i32 {
        self.0.layout.units_per_floor().into()
    }

    /// Indicator whether floors of this `Block` have halls.
    pub fn has_halls(&self) -> bool {
        self.0.layout.has_halls()
    }

    /// Number of halls on each floor of this `Block`.
    pub fn halls_per_floor(&self) -> i32 {
        self.0.layout.halls_per_floor().into()
    }
}

/// Unique identifier of a `Block`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::block::Id)]
#[into(domain::block::Id)]
#[graphql(name = "BlockId", transparent)]
pub struct Id(Uuid);

/// Name of a `Block`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "BlockName", with = scalar::Via::<domain::block::Name>)]
pub struct Name(domain::block::Name);

/// Shape of a `Block` used to generate its `Unit`s.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "BlockLayoutInput")]
pub struct LayoutInput {
    /// Number of floors.
    pub floor_count: i32,

    /// Number of apartments on each floor.
    pub units_per_floor: i32,

    /// Indicator whether floors have halls.
    #[graphql(default = false)]
    pub has_halls: bool,

    /// Number of halls on each floor.
    ///
    /// At least one hall is assumed when `hasHalls` is set.
    #[graphql(default = 1)]
    pub halls_per_floor: i32,
}

impl TryFrom<LayoutInput> for domain::block::Layout {
    type Error = Error;

    fn try_from(input: LayoutInput) -> Result<Self, Self::Error> {
        let LayoutInput {
            floor_count,
            units_per_floor,
            has_halls,
            halls_per_floor,
        } = input;
        Self::new(
            api::count(floor_count)?,
            api::count(units_per_floor)?,
            has_halls,
            api::count(halls_per_floor)?,
        )
        .map_err(|e| Error::from(LayoutError::Invalid).with_message(&e))
    }
}

/// `Block` to be created in a `Development`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "BlockInput")]
pub struct Input {
    /// Name of the `Block`.
    pub name: Name,

    /// Layout of the `Block`.
    pub layout: LayoutInput,
}

impl TryFrom<Input> for NewBlock {
    type Error = Error;

    fn try_from(input: Input) -> Result<Self, Self::Error> {
        Ok(Self {
            name: input.name.into(),
            layout: input.layout.try_into()?,
        })
    }
}

define_error! {
    enum LayoutError {
        #[code = "INVALID_BLOCK_LAYOUT"]
        #[status = BAD_REQUEST]
        #[message = "`Block` must have at least one floor and one apartment \
                     per floor"]
        Invalid,
    }
}
