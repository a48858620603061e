//! GraphQL [`Query`]s definitions.

use common::Area;
use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Development` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEVELOPMENT_NOT_EXISTS` - the `Development` with the specified ID
    ///                              does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "development",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn development(
        id: api::development::Id,
        ctx: &Context,
    ) -> Result<api::Development, Error> {
        ctx.service()
            .execute(query::development::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| DevelopmentError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists `Development`s ordered by name.
    #[tracing::instrument(
        skip_all,
        fields(
            active_only = active_only,
            gql.name = "developments",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn developments(
        #[graphql(default = false)] active_only: bool,
        ctx: &Context,
    ) -> Result<Vec<api::Development>, Error> {
        ctx.service()
            .execute(query::development::List::by(
                read::development::Filter { active_only },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Lists `Block`s of the specified `Development`, ordered by name.
    ///
    /// Empty list is returned for an unknown `Development`.
    #[tracing::instrument(
        skip_all,
        fields(
            development_id = %development_id,
            gql.name = "blocks",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn blocks(
        development_id: api::development::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Block>, Error> {
        ctx.service()
            .execute(query::block::ByDevelopment::by(development_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Lists `Unit`s of the specified `Development`, ordered by `Block` name,
    /// floor and label.
    ///
    /// Empty list is returned for an unknown `Development`.
    #[tracing::instrument(
        skip_all,
        fields(
            development_id = %development_id,
            gql.name = "units",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn units(
        development_id: api::development::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Unit>, Error> {
        ctx.service()
            .execute(query::unit::ByDevelopment::by(development_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns the `Contract` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` with the specified ID does not
    ///                           exist or is deleted.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "contract",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn contract(
        id: api::contract::Id,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        ctx.service()
            .execute(query::contract::ById(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ContractError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists not deleted `Contract`s, the newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            active_only = active_only,
            gql.name = "contracts",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn contracts(
        #[graphql(default = false)] active_only: bool,
        ctx: &Context,
    ) -> Result<Vec<api::Contract>, Error> {
        ctx.service()
            .execute(query::contract::List(read::contract::Filter {
                active_only,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Proposes an equal-share distribution of the contracted area of the
    /// specified floor across its apartments, without saving it.
    ///
    /// When `includeHall` is set, `hallArea` is taken from the floor first
    /// and split equally across the hall `Unit`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` with the specified ID does not
    ///                           exist or is deleted;
    /// - `FLOOR_NOT_CONTRACTED` - the floor has no contracted area;
    /// - `NO_APARTMENTS` - there are no apartments on the floor;
    /// - `NO_HALL` - the hall area is requested, but there are no halls on
    ///               the floor;
    /// - `HALL_EXCEEDS_FLOOR` - the hall area exceeds the floor area;
    /// - `INVALID_FLOOR` - the floor number is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            contract_id = %contract_id,
            floor = floor,
            gql.name = "distributionPreview",
            hall_area = ?hall_area.map(|a| a.to_string()),
            include_hall = include_hall,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn distribution_preview(
        contract_id: api::contract::Id,
        floor: i32,
        #[graphql(default = false)] include_hall: bool,
        hall_area: Option<Area>,
        ctx: &Context,
    ) -> Result<api::distribution::Proposal, Error> {
        let floor = api::floor(floor).map_err(ctx.error())?;
        ctx.service()
            .execute(query::distribution::Preview {
                contract_id: contract_id.into(),
                floor,
                include_hall,
                hall_area,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the saved distribution plan of the specified `Contract`,
    /// ordered by `Block` name, floor and `Unit` label.
    #[tracing::instrument(
        skip_all,
        fields(
            contract_id = %contract_id,
            gql.name = "distribution",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn distribution(
        contract_id: api::contract::Id,
        ctx: &Context,
    ) -> Result<Vec<api::distribution::Line>, Error> {
        ctx.service()
            .execute(query::distribution::ByContract::by(contract_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|lines| lines.into_iter().map(Into::into).collect())
    }

    /// Lists `Execution`s of the specified `Contract`, the latest measured
    /// first.
    #[tracing::instrument(
        skip_all,
        fields(
            contract_id = %contract_id,
            gql.name = "executions",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn executions(
        contract_id: api::contract::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Execution>, Error> {
        ctx.service()
            .execute(query::execution::ByContract::by(contract_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }
}

impl AsError for query::distribution::PreviewError {
    fn try_as_error(&self) -> Option<Error> {
        use service::domain::distribution::ProposalError as P;

        define_error! {
            enum Error {
                #[code = "FLOOR_NOT_CONTRACTED"]
                #[status = NOT_FOUND]
                #[message = "Floor has no contracted area"]
                FloorNotContracted,

                #[code = "NO_APARTMENTS"]
                #[status = NOT_FOUND]
                #[message = "There are no apartments on the floor"]
                NoApartments,

                #[code = "NO_HALL"]
                #[status = NOT_FOUND]
                #[message = "There are no halls on the floor"]
                NoHall,

                #[code = "HALL_EXCEEDS_FLOOR"]
                #[status = BAD_REQUEST]
                #[message = "Hall area exceeds the floor area"]
                HallExceedsFloor,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ContractNotExists(_) => Some(ContractError::NotExists.into()),
            Self::FloorNotContracted(_) => Some(
                crate::Error::from(Error::FloorNotContracted)
                    .with_message(self),
            ),
            Self::Proposal(P::NoApartments) => Some(Error::NoApartments.into()),
            Self::Proposal(P::NoHall) => Some(Error::NoHall.into()),
            Self::Proposal(P::HallExceedsFloor { .. }) => Some(
                crate::Error::from(Error::HallExceedsFloor).with_message(self),
            ),
        }
    }
}

define_error! {
    enum ContractError {
        #[code = "CONTRACT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Contract` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum DevelopmentError {
        #[code = "DEVELOPMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Development` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UnitError {
        #[code = "UNIT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Unit` with the specified ID does not exist"]
        NotExists,
    }
}
