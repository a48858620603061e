//! GraphQL [`Mutation`]s definitions.

use common::{Area, Date, Money};
use juniper::{graphql_object, Nullable};
use service::{
    command::{self, create_development::NewBlock},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Development` along with its `Block`s.
    ///
    /// `Block`s are described either explicitly with `blocks`, or with
    /// `blockCount` and `layout`, which creates `Block 01`, `Block 02` and so
    /// on sharing the same layout. No `Unit`s are created until
    /// `generateUnits` is called.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_BLOCKS` - `Block`s are described in both ways, or
    ///                        `blockCount` is provided without `layout` (or
    ///                        vice versa);
    /// - `DUPLICATE_BLOCK_NAME` - several `Block`s share the same name;
    /// - `INVALID_BLOCK_LAYOUT` - a `Block` has no floors or no apartments.
    #[tracing::instrument(
        skip_all,
        fields(
            block_count = ?block_count,
            gql.name = "createDevelopment",
            is_active = is_active,
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_development(
        name: api::development::Name,
        notes: Option<api::Notes>,
        #[graphql(default = true)] is_active: bool,
        blocks: Option<Vec<api::block::Input>>,
        block_count: Option<i32>,
        layout: Option<api::block::LayoutInput>,
        ctx: &Context,
    ) -> Result<api::Development, Error> {
        let blocks = new_blocks(blocks, block_count, layout)
            .map_err(ctx.error())?
            .unwrap_or_default();

        ctx.service()
            .execute(command::CreateDevelopment {
                name: name.into(),
                notes: notes.map(Into::into),
                is_active,
                blocks,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided fields of the `Development` with the specified
    /// ID.
    ///
    /// When `Block`s are described, they replace the current ones matching
    /// by name: matching `Block`s get the new layout keeping their `Unit`s,
    /// missing ones are created, and the ones not listed are removed along
    /// with their `Unit`s. `Unit`s left out of a shrunk layout are removed
    /// too.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEVELOPMENT_NOT_EXISTS` - the `Development` with the specified ID
    ///                              does not exist;
    /// - `AMBIGUOUS_BLOCKS` - `Block`s are described in both ways, or
    ///                        `blockCount` is provided without `layout` (or
    ///                        vice versa);
    /// - `DUPLICATE_BLOCK_NAME` - several `Block`s share the same name;
    /// - `INVALID_BLOCK_LAYOUT` - a `Block` has no floors or no apartments;
    /// - `UNIT_HAS_EXECUTIONS` - `Unit`s to be removed have recorded
    ///                           `Execution`s.
    #[tracing::instrument(
        skip_all,
        fields(
            block_count = ?block_count,
            gql.name = "updateDevelopment",
            id = %id,
            is_active = ?is_active,
            name = ?name.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_development(
        id: api::development::Id,
        name: Option<api::development::Name>,
        notes: Nullable<api::Notes>,
        is_active: Option<bool>,
        blocks: Option<Vec<api::block::Input>>,
        block_count: Option<i32>,
        layout: Option<api::block::LayoutInput>,
        ctx: &Context,
    ) -> Result<api::Development, Error> {
        let blocks =
            new_blocks(blocks, block_count, layout).map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateDevelopment {
                id: id.into(),
                name: name.map(Into::into),
                notes: notes.explicit().map(|n| n.map(Into::into)),
                is_active,
                blocks,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Development` with the specified ID along with its
    /// `Block`s, `Unit`s, `Contract`s, distribution plans and `Execution`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEVELOPMENT_NOT_EXISTS` - the `Development` with the specified ID
    ///                              does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteDevelopment",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_development(
        id: api::development::Id,
        ctx: &Context,
    ) -> Result<api::Development, Error> {
        ctx.service()
            .execute(command::DeleteDevelopment { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Generates the missing `Unit`s of the `Development` with the specified
    /// ID according to its `Block` layouts.
    ///
    /// Only the `Block` with the specified `blockId` is processed, if
    /// provided. Existing `Unit`s are skipped, so the generation may be
    /// repeated safely. Every `Block` is generated independently: a failed
    /// `Block` is reported in the result without affecting the others.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEVELOPMENT_NOT_EXISTS` - the `Development` with the specified ID
    ///                              does not exist;
    /// - `BLOCK_NOT_EXISTS` - the `Block` with the specified ID does not
    ///                        exist in the `Development`;
    /// - `NO_BLOCKS` - the `Development` has no `Block`s.
    #[tracing::instrument(
        skip_all,
        fields(
            block_id = ?block_id.map(|id| id.to_string()),
            development_id = %development_id,
            gql.name = "generateUnits",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn generate_units(
        development_id: api::development::Id,
        block_id: Option<api::block::Id>,
        ctx: &Context,
    ) -> Result<api::unit::generation::Outcome, Error> {
        ctx.service()
            .execute(command::GenerateUnits {
                development_id: development_id.into(),
                block_id: block_id.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Unit` on the specified floor of the `Block` with the
    /// specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BLOCK_NOT_EXISTS` - the `Block` with the specified ID does not
    ///                        exist;
    /// - `FLOOR_OUT_OF_RANGE` - the `Block` has no such floor;
    /// - `UNIT_ALREADY_EXISTS` - a `Unit` with the same label already exists
    ///                           on the floor;
    /// - `INVALID_FLOOR` - the floor number is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            block_id = %block_id,
            floor = floor,
            gql.name = "createUnit",
            kind = ?kind,
            label = %label,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_unit(
        block_id: api::block::Id,
        floor: i32,
        label: api::unit::Label,
        #[graphql(default = api::unit::Kind::Apartment)] kind: api::unit::Kind,
        typology: Option<api::unit::Typology>,
        total_area: Option<Area>,
        notes: Option<api::Notes>,
        ctx: &Context,
    ) -> Result<api::Unit, Error> {
        let floor = api::floor(floor).map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateUnit {
                block_id: block_id.into(),
                floor,
                label: label.into(),
                kind: kind.into(),
                typology: typology.map(Into::into),
                total_area,
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Replaces the descriptive fields of the `Unit` with the specified ID.
    ///
    /// Omitted fields are cleared.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `UNIT_NOT_EXISTS` - the `Unit` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateUnit",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_unit(
        id: api::unit::Id,
        typology: Option<api::unit::Typology>,
        total_area: Option<Area>,
        notes: Option<api::Notes>,
        ctx: &Context,
    ) -> Result<api::Unit, Error> {
        ctx.service()
            .execute(command::UpdateUnit {
                id: id.into(),
                typology: typology.map(Into::into),
                total_area,
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Unit` with the specified ID along with its distribution
    /// entries.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `UNIT_NOT_EXISTS` - the `Unit` with the specified ID does not exist;
    /// - `UNIT_HAS_EXECUTIONS` - the `Unit` has recorded `Execution`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteUnit",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_unit(
        id: api::unit::Id,
        ctx: &Context,
    ) -> Result<api::Unit, Error> {
        ctx.service()
            .execute(command::DeleteUnit { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Contract` in the `Development` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEVELOPMENT_NOT_EXISTS` - the `Development` with the specified ID
    ///                              does not exist;
    /// - `CONTRACT_NUMBER_OCCUPIED` - the `ContractNumber` is used by another
    ///                                `Contract`;
    /// - `INVALID_CONTRACT_TERMS` - the total area is zero, some value is
    ///                              negative or the work ends before it
    ///                              starts;
    /// - `DUPLICATE_FLOOR` - a floor is repeated in `areaByFloor`;
    /// - `INVALID_FLOOR` - a floor number is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            development_id = %development_id,
            gql.name = "createContract",
            number = %number,
            otel.name = Self::SPAN_NAME,
            service_type = ?service_type,
            status = ?status,
            total_area = %total_area,
            total_value = %total_value,
        ),
    )]
    pub async fn create_contract(
        number: api::contract::Number,
        development_id: api::development::Id,
        service_type: api::contract::ServiceType,
        total_value: Money,
        value_per_area: Option<Money>,
        total_area: Area,
        area_by_floor: Vec<api::contract::FloorAreaInput>,
        #[graphql(default = api::contract::Status::Active)]
        status: api::contract::Status,
        notes: Option<api::Notes>,
        starts_on: Option<Date>,
        expected_end_on: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        let area_by_floor = api::contract::area_by_floor(area_by_floor)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateContract {
                number: number.into(),
                development_id: development_id.into(),
                service_type: service_type.into(),
                total_value,
                value_per_area,
                total_area,
                area_by_floor,
                status: status.into(),
                notes: notes.map(Into::into),
                starts_on,
                expected_end_on,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| api::Contract::lazy(c.id))
    }

    /// Updates the provided fields of the `Contract` with the specified ID.
    ///
    /// Fields provided as `null` are cleared.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` with the specified ID does not
    ///                           exist or is deleted;
    /// - `CONTRACT_NUMBER_OCCUPIED` - the `ContractNumber` is used by another
    ///                                `Contract`;
    /// - `INVALID_CONTRACT_TERMS` - the total area is zero, some value is
    ///                              negative or the work ends before it
    ///                              starts;
    /// - `DUPLICATE_FLOOR` - a floor is repeated in `areaByFloor`;
    /// - `INVALID_FLOOR` - a floor number is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateContract",
            id = %id,
            number = ?number.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_contract(
        id: api::contract::Id,
        number: Option<api::contract::Number>,
        service_type: Option<api::contract::ServiceType>,
        total_value: Option<Money>,
        value_per_area: Nullable<Money>,
        total_area: Option<Area>,
        area_by_floor: Option<Vec<api::contract::FloorAreaInput>>,
        status: Option<api::contract::Status>,
        notes: Nullable<api::Notes>,
        starts_on: Nullable<Date>,
        expected_end_on: Nullable<Date>,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        let area_by_floor = area_by_floor
            .map(api::contract::area_by_floor)
            .transpose()
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateContract {
                id: id.into(),
                number: number.map(Into::into),
                service_type: service_type.map(Into::into),
                total_value,
                value_per_area: value_per_area.explicit(),
                total_area,
                area_by_floor,
                status: status.map(Into::into),
                notes: notes.explicit().map(|n| n.map(Into::into)),
                starts_on: starts_on.explicit(),
                expected_end_on: expected_end_on.explicit(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| api::Contract::lazy(c.id))
    }

    /// Deletes the `Contract` with the specified ID, keeping its
    /// `ContractNumber` occupied.
    ///
    /// Returns the ID of the deleted `Contract`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` with the specified ID does not
    ///                           exist or is already deleted.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteContract",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_contract(
        id: api::contract::Id,
        ctx: &Context,
    ) -> Result<api::contract::Id, Error> {
        ctx.service()
            .execute(command::DeleteContract { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| c.id.into())
    }

    /// Replaces the distribution plan of the `Contract` with the specified
    /// ID.
    ///
    /// For every floor present in the plan, its entries must sum up to the
    /// contracted area of the floor within the configured tolerance.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` with the specified ID does not
    ///                           exist or is deleted;
    /// - `EMPTY_DISTRIBUTION_PLAN` - no entries are provided;
    /// - `DUPLICATE_UNIT` - a `Unit` is allocated more than once;
    /// - `UNKNOWN_UNITS` - some `Unit`s don't belong to the `Contract`
    ///                     `Development`;
    /// - `DISTRIBUTION_PLAN_VIOLATED` - some floor is not contracted or its
    ///                                  entries don't sum up to its area.
    #[tracing::instrument(
        skip_all,
        fields(
            contract_id = %contract_id,
            entries = entries.len(),
            gql.name = "saveDistribution",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn save_distribution(
        contract_id: api::contract::Id,
        entries: Vec<api::distribution::EntryInput>,
        ctx: &Context,
    ) -> Result<Vec<api::distribution::Line>, Error> {
        _ = ctx
            .service()
            .execute(command::SaveDistribution {
                contract_id: contract_id.into(),
                entries: entries.into_iter().map(Into::into).collect(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        api::Query::distribution(contract_id, ctx).await
    }

    /// Records the area executed in the `Unit` with the specified ID under
    /// the `Contract` with the specified ID.
    ///
    /// The `Unit` must be distributed in the `Contract` plan. Executions
    /// exceeding the contracted area are accepted.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CONTRACT_NOT_EXISTS` - the `Contract` with the specified ID does not
    ///                           exist or is deleted;
    /// - `UNIT_NOT_EXISTS` - the `Unit` with the specified ID does not exist;
    /// - `UNIT_NOT_DISTRIBUTED` - the `Unit` is not in the `Contract` plan;
    /// - `INVALID_EXECUTED_AREA` - the executed area is not positive or is
    ///                             too large;
    /// - `NO_MEASUREMENT_DATE` - the measurement `Date` is not provided.
    #[tracing::instrument(
        skip_all,
        fields(
            area = %area,
            contract_id = %contract_id,
            gql.name = "recordExecution",
            measured_on = ?measured_on.map(|d| d.to_string()),
            otel.name = Self::SPAN_NAME,
            responsible = %responsible,
            unit_id = %unit_id,
        ),
    )]
    pub async fn record_execution(
        contract_id: api::contract::Id,
        unit_id: api::unit::Id,
        area: Area,
        measured_on: Option<Date>,
        responsible: api::execution::Responsible,
        notes: Option<api::Notes>,
        ctx: &Context,
    ) -> Result<api::Execution, Error> {
        ctx.service()
            .execute(command::RecordExecution {
                contract_id: contract_id.into(),
                unit_id: unit_id.into(),
                area: area.decimal(),
                measured_on,
                responsible: responsible.into(),
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Approves the `Execution` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `EXECUTION_NOT_EXISTS` - the `Execution` with the specified ID does
    ///                            not exist;
    /// - `EXECUTION_ALREADY_APPROVED` - the `Execution` is already approved.
    #[tracing::instrument(
        skip_all,
        fields(
            approver = %approver,
            gql.name = "approveExecution",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn approve_execution(
        id: api::execution::Id,
        approver: api::execution::Approver,
        ctx: &Context,
    ) -> Result<api::Execution, Error> {
        ctx.service()
            .execute(command::ApproveExecution {
                id: id.into(),
                approver: approver.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Builds the [`NewBlock`]s out of either an explicit list, or a number of
/// `Block`s sharing the same layout.
///
/// [`None`] is returned if `Block`s are not described at all.
///
/// # Errors
///
/// If `Block`s are described ambiguously, or any of them is invalid.
fn new_blocks(
    blocks: Option<Vec<api::block::Input>>,
    block_count: Option<i32>,
    layout: Option<api::block::LayoutInput>,
) -> Result<Option<Vec<NewBlock>>, Error> {
    match (blocks, block_count, layout) {
        (None, None, None) => Ok(None),
        (Some(blocks), None, None) => blocks
            .into_iter()
            .map(NewBlock::try_from)
            .collect::<Result<_, _>>()
            .map(Some),
        (None, Some(count), Some(layout)) => Ok(Some(NewBlock::numbered(
            api::count(count)?.into(),
            layout.try_into()?,
        ))),
        (Some(_), ..) | (None, Some(_), None) | (None, None, Some(_)) => {
            Err(BlocksError::Ambiguous.into())
        }
    }
}

define_error! {
    enum BlocksError {
        #[code = "AMBIGUOUS_BLOCKS"]
        #[status = BAD_REQUEST]
        #[message = "`Block`s must be described either with `blocks`, or \
                     with both `blockCount` and `layout`"]
        Ambiguous,
    }
}

impl AsError for command::create_development::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DuplicateBlockName(_) => Some(
                Error::from(DevelopmentError::DuplicateBlockName)
                    .with_message(self),
            ),
        }
    }
}

impl AsError for command::update_development::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DevelopmentNotExists(_) => {
                Some(api::query::DevelopmentError::NotExists.into())
            }
            Self::DuplicateBlockName(_) => Some(
                Error::from(DevelopmentError::DuplicateBlockName)
                    .with_message(self),
            ),
            Self::UnitsHaveExecutions(_) => Some(
                Error::from(DevelopmentError::UnitsHaveExecutions)
                    .with_message(self),
            ),
        }
    }
}

impl AsError for command::delete_development::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DevelopmentNotExists(_) => {
                Some(api::query::DevelopmentError::NotExists.into())
            }
        }
    }
}

define_error! {
    enum DevelopmentError {
        #[code = "DUPLICATE_BLOCK_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Several `Block`s share the same name"]
        DuplicateBlockName,

        #[code = "UNIT_HAS_EXECUTIONS"]
        #[status = CONFLICT]
        #[message = "`Unit`s to be removed have recorded `Execution`s"]
        UnitsHaveExecutions,
    }
}

impl AsError for command::generate_units::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BLOCK_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Block` with the specified ID does not exist in \
                             the `Development`"]
                BlockNotExists,

                #[code = "NO_BLOCKS"]
                #[status = NOT_FOUND]
                #[message = "`Development` has no `Block`s"]
                NoBlocks,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::BlockNotExists(_) => Some(Error::BlockNotExists.into()),
            Self::DevelopmentNotExists(_) => {
                Some(api::query::DevelopmentError::NotExists.into())
            }
            Self::NoBlocks(_) => Some(Error::NoBlocks.into()),
        }
    }
}

impl AsError for command::create_unit::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BLOCK_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Block` with the specified ID does not exist"]
                BlockNotExists,

                #[code = "FLOOR_OUT_OF_RANGE"]
                #[status = BAD_REQUEST]
                #[message = "`Block` has no such floor"]
                FloorOutOfRange,

                #[code = "UNIT_ALREADY_EXISTS"]
                #[status = CONFLICT]
                #[message = "`Unit` with the same label already exists on \
                             the floor"]
                UnitAlreadyExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::BlockNotExists(_) => Some(Error::BlockNotExists.into()),
            Self::FloorOutOfRange { .. } => Some(
                crate::Error::from(Error::FloorOutOfRange).with_message(self),
            ),
            Self::UnitAlreadyExists { .. } => Some(
                crate::Error::from(Error::UnitAlreadyExists)
                    .with_message(self),
            ),
        }
    }
}

impl AsError for command::update_unit::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UnitNotExists(_) => {
                Some(api::query::UnitError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_unit::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "UNIT_HAS_EXECUTIONS"]
                #[status = CONFLICT]
                #[message = "`Unit` has recorded `Execution`s"]
                UnitHasExecutions,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UnitHasExecutions(_) => Some(Error::UnitHasExecutions.into()),
            Self::UnitNotExists(_) => {
                Some(api::query::UnitError::NotExists.into())
            }
        }
    }
}

define_error! {
    enum ContractError {
        #[code = "CONTRACT_NUMBER_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`ContractNumber` is used by another `Contract`"]
        NumberOccupied,

        #[code = "INVALID_CONTRACT_TERMS"]
        #[status = BAD_REQUEST]
        #[message = "`Contract` terms are invalid"]
        InvalidTerms,
    }
}

impl AsError for command::create_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DevelopmentNotExists(_) => {
                Some(api::query::DevelopmentError::NotExists.into())
            }
            Self::NumberAlreadyExists(_) => {
                Some(ContractError::NumberOccupied.into())
            }
            Self::Terms(e) => Some(
                Error::from(ContractError::InvalidTerms).with_message(e),
            ),
        }
    }
}

impl AsError for command::update_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ContractNotExists(_) => {
                Some(api::query::ContractError::NotExists.into())
            }
            Self::NumberAlreadyExists(_) => {
                Some(ContractError::NumberOccupied.into())
            }
            Self::Terms(e) => Some(
                Error::from(ContractError::InvalidTerms).with_message(e),
            ),
        }
    }
}

impl AsError for command::delete_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ContractNotExists(_) => {
                Some(api::query::ContractError::NotExists.into())
            }
        }
    }
}

impl AsError for command::save_distribution::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMPTY_DISTRIBUTION_PLAN"]
                #[status = BAD_REQUEST]
                #[message = "Distribution plan cannot be empty"]
                EmptyPlan,

                #[code = "DUPLICATE_UNIT"]
                #[status = BAD_REQUEST]
                #[message = "`Unit` is allocated more than once"]
                DuplicateUnit,

                #[code = "UNKNOWN_UNITS"]
                #[status = BAD_REQUEST]
                #[message = "`Unit`s don't belong to the `Contract` \
                             `Development`"]
                UnknownUnits,

                #[code = "DISTRIBUTION_PLAN_VIOLATED"]
                #[status = BAD_REQUEST]
                #[message = "Distribution plan doesn't match the contracted \
                             floors"]
                PlanViolated,
            }
        }

        let code = match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ContractNotExists(_) => {
                return Some(api::query::ContractError::NotExists.into());
            }
            Self::EmptyPlan => Error::EmptyPlan,
            Self::DuplicateUnit(_) => Error::DuplicateUnit,
            Self::UnknownUnits(_) => Error::UnknownUnits,
            Self::PlanViolated(_) => Error::PlanViolated,
        };
        Some(crate::Error::from(code).with_message(self))
    }
}

impl AsError for command::record_execution::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "UNIT_NOT_DISTRIBUTED"]
                #[status = BAD_REQUEST]
                #[message = "`Unit` is not in the `Contract` distribution \
                             plan"]
                UnitNotDistributed,

                #[code = "INVALID_EXECUTED_AREA"]
                #[status = BAD_REQUEST]
                #[message = "Executed area must be positive and within the \
                             `Area` limit"]
                InvalidArea,

                #[code = "NO_MEASUREMENT_DATE"]
                #[status = BAD_REQUEST]
                #[message = "Measurement `Date` must be provided"]
                NoMeasurementDate,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ContractNotExists(_) => {
                Some(api::query::ContractError::NotExists.into())
            }
            Self::UnitNotExists(_) => {
                Some(api::query::UnitError::NotExists.into())
            }
            Self::UnitNotDistributed(_) => {
                Some(Error::UnitNotDistributed.into())
            }
            Self::InvalidArea(_) => Some(
                crate::Error::from(Error::InvalidArea).with_message(self),
            ),
            Self::NoMeasurementDate => Some(Error::NoMeasurementDate.into()),
        }
    }
}

impl AsError for command::approve_execution::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EXECUTION_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Execution` with the specified ID does not exist"]
                ExecutionNotExists,

                #[code = "EXECUTION_ALREADY_APPROVED"]
                #[status = CONFLICT]
                #[message = "`Execution` is already approved"]
                AlreadyApproved,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ExecutionNotExists(_) => {
                Some(Error::ExecutionNotExists.into())
            }
            Self::AlreadyApproved(_) => Some(Error::AlreadyApproved.into()),
        }
    }
}
