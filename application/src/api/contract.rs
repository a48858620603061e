//! [`Contract`]-related definitions.

use std::{collections::BTreeSet, future};

use common::{Area, Date, DateTime, Money, Percent};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, define_error, AsError, Context, Error};

/// A service agreement.
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    id: Id,

    /// Underlying [`read::contract::Details`].
    details: OnceCell<read::contract::Details>,
}

impl From<read::contract::Details> for Contract {
    fn from(details: read::contract::Details) -> Self {
        Self {
            id: details.contract.id.into(),
            details: OnceCell::new_with(Some(details)),
        }
    }
}

impl Contract {
    /// Creates a new [`Contract`] with the provided ID, loading its details
    /// on the first access.
    ///
    /// Accessing a [`Contract`] which doesn't exist results in an error.
    #[must_use]
    pub(crate) fn lazy(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            details: OnceCell::new(),
        }
    }

    /// Returns the underlying [`read::contract::Details`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Contract`] doesn't exist.
    async fn details(
        &self,
        ctx: &Context,
    ) -> Result<&read::contract::Details, Error> {
        let id = self.id.into();
        self.details
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::contract::ById(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|d| {
                        future::ready(d.ok_or_else(|| {
                            api::query::ContractError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Returns the underlying [`domain::Contract`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Contract`] doesn't exist.
    async fn contract(&self, ctx: &Context) -> Result<&domain::Contract, Error> {
        Ok(&self.details(ctx).await?.contract)
    }
}

/// A flooring or tiling service agreement over a `Development`.
#[graphql_object(context = Context)]
impl Contract {
    /// Unique identifier of this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Globally unique number of this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.number",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn number(&self, ctx: &Context) -> Result<Number, Error> {
        Ok(self.contract(ctx).await?.number.clone().into())
    }

    /// `Development` this `Contract` is executed in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.development",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn development(
        &self,
        ctx: &Context,
    ) -> Result<api::Development, Error> {
        let id = self.contract(ctx).await?.development_id;
        api::Query::development(id.into(), ctx).await
    }

    /// Name of the `Development` this `Contract` is executed in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.developmentName",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn development_name(
        &self,
        ctx: &Context,
    ) -> Result<api::development::Name, Error> {
        Ok(self.details(ctx).await?.development_name.clone().into())
    }

    /// Kind of service agreed in this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.serviceType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn service_type(
        &self,
        ctx: &Context,
    ) -> Result<ServiceType, Error> {
        Ok(self.contract(ctx).await?.service_type.into())
    }

    /// Total value of this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.totalValue",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn total_value(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.contract(ctx).await?.total_value)
    }

    /// Value of a single square meter, if agreed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.valuePerArea",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn value_per_area(
        &self,
        ctx: &Context,
    ) -> Result<Option<Money>, Error> {
        Ok(self.contract(ctx).await?.value_per_area)
    }

    /// Total contracted area.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.totalArea",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn total_area(&self, ctx: &Context) -> Result<Area, Error> {
        Ok(self.contract(ctx).await?.total_area)
    }

    /// Contracted area of each floor, in ascending floor order.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.areaByFloor",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn area_by_floor(
        &self,
        ctx: &Context,
    ) -> Result<Vec<FloorArea>, Error> {
        Ok(self
            .contract(ctx)
            .await?
            .area_by_floor
            .iter()
            .map(|(floor, area)| FloorArea {
                floor: floor.into(),
                area,
            })
            .collect())
    }

    /// Status of this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.contract(ctx).await?.status.into())
    }

    /// Notes about this `Contract`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.notes",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn notes(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Notes>, Error> {
        Ok(self.contract(ctx).await?.notes.clone().map(Into::into))
    }

    /// `Date` when the work starts, if planned.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.startsOn",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn starts_on(&self, ctx: &Context) -> Result<Option<Date>, Error> {
        Ok(self.contract(ctx).await?.starts_on)
    }

    /// `Date` when the work is expected to end, if planned.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.expectedEndOn",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn expected_end_on(
        &self,
        ctx: &Context,
    ) -> Result<Option<Date>, Error> {
        Ok(self.contract(ctx).await?.expected_end_on)
    }

    /// Sum of the area executed under this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.executedArea",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn executed_area(&self, ctx: &Context) -> Result<Area, Error> {
        Ok(self.details(ctx).await?.executed_area)
    }

    /// Executed part of the total area, rounded to two decimal places.
    ///
    /// May exceed `100`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.percentExecuted",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn percent_executed(
        &self,
        ctx: &Context,
    ) -> Result<Percent, Error> {
        Ok(self.details(ctx).await?.percent_executed)
    }

    /// Saved distribution plan of this `Contract`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.distribution",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn distribution(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::distribution::Line>, Error> {
        api::Query::distribution(self.id, ctx).await
    }

    /// `Execution`s recorded under this `Contract`, the latest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.executions",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn executions(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Execution>, Error> {
        api::Query::executions(self.id, ctx).await
    }

    /// `DateTime` when this `Contract` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.contract(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Contract` was modified last time.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Contract.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.contract(ctx).await?.updated_at.coerce())
    }
}

/// Unique identifier of a `Contract`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::contract::Id)]
#[into(domain::contract::Id)]
#[graphql(name = "ContractId", transparent)]
pub struct Id(Uuid);

/// External reference number of a `Contract`, like `CT-2024/001`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ContractNumber",
    with = scalar::Via::<domain::contract::Number>,
)]
pub struct Number(domain::contract::Number);

/// Kind of service agreed in a `Contract`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ContractServiceType")]
pub enum ServiceType {
    /// Floor covering.
    Flooring,

    /// Wall tiling.
    Tiling,

    /// Both floor covering and wall tiling.
    Both,
}

impl From<domain::contract::ServiceType> for ServiceType {
    fn from(kind: domain::contract::ServiceType) -> Self {
        use domain::contract::ServiceType as K;
        match kind {
            K::Flooring => Self::Flooring,
            K::Tiling => Self::Tiling,
            K::Both => Self::Both,
        }
    }
}

impl From<ServiceType> for domain::contract::ServiceType {
    fn from(kind: ServiceType) -> Self {
        match kind {
            ServiceType::Flooring => Self::Flooring,
            ServiceType::Tiling => Self::Tiling,
            ServiceType::Both => Self::Both,
        }
    }
}

/// Status of a `Contract`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ContractStatus")]
pub enum Status {
    /// Work is in progress.
    Active,

    /// Work is suspended.
    Paused,

    /// Work is finished.
    Closed,
}

impl From<domain::contract::Status> for Status {
    fn from(status: domain::contract::Status) -> Self {
        use domain::contract::Status as S;
        match status {
            S::Active => Self::Active,
            S::Paused => Self::Paused,
            S::Closed => Self::Closed,
        }
    }
}

impl From<Status> for domain::contract::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Active => Self::Active,
            Status::Paused => Self::Paused,
            Status::Closed => Self::Closed,
        }
    }
}

/// Contracted area of a single floor.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "ContractFloorArea")]
pub struct FloorArea {
    /// Floor number, starting from `1`.
    pub floor: i32,

    /// Contracted area of the floor.
    pub area: Area,
}

/// Contracted area of a single floor.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "ContractFloorAreaInput")]
pub struct FloorAreaInput {
    /// Floor number, starting from `1`.
    pub floor: i32,

    /// Contracted area of the floor.
    pub area: Area,
}

/// Converts the provided [`FloorAreaInput`]s into a
/// [`domain::contract::AreaByFloor`].
///
/// # Errors
///
/// If any floor is invalid or repeated.
pub(crate) fn area_by_floor(
    floors: Vec<FloorAreaInput>,
) -> Result<domain::contract::AreaByFloor, Error> {
    let mut seen = BTreeSet::new();
    let floors = floors
        .into_iter()
        .map(|FloorAreaInput { floor, area }| {
            let floor = api::floor(floor)?;
            if seen.insert(floor) {
                Ok((floor, area))
            } else {
                Err(Error::from(FloorsError::Duplicate)
                    .with_message(&format!("Floor {floor} is repeated")))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    domain::contract::AreaByFloor::new(floors).map_err(|e| {
        Error::from(api::InputError::Floor).with_message(&e)
    })
}

define_error! {
    enum FloorsError {
        #[code = "DUPLICATE_FLOOR"]
        #[status = BAD_REQUEST]
        #[message = "Floor is repeated in the contracted areas"]
        Duplicate,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Area;

    use super::{area_by_floor, FloorAreaInput};

    fn input(floor: i32, area: &str) -> FloorAreaInput {
        FloorAreaInput {
            floor,
            area: Area::from_str(area).unwrap(),
        }
    }

    #[test]
    fn converts_floor_areas() {
        let floors =
            area_by_floor(vec![input(2, "120.5"), input(1, "300")]).unwrap();

        assert_eq!(floors.total(), Area::from_str("420.5").unwrap());
        assert_eq!(
            floors.iter().map(|(f, _)| f).collect::<Vec<_>>(),
            [1, 2],
        );
    }

    #[test]
    fn rejects_repeated_floors() {
        let err = area_by_floor(vec![input(1, "10"), input(1, "20")])
            .unwrap_err();

        assert_eq!(err.code, "DUPLICATE_FLOOR");
        assert_eq!(err.message, "Floor 1 is repeated");
    }

    #[test]
    fn rejects_invalid_floors() {
        let err = area_by_floor(vec![input(0, "10")]).unwrap_err();

        assert_eq!(err.code, "INVALID_FLOOR");
    }
}
