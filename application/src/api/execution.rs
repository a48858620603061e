//! [`Execution`]-related definitions.

use common::{Area, Date, DateTime};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLObject, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A measurement of executed area.
#[derive(Clone, Debug, From)]
pub struct Execution(domain::Execution);

/// A measurement of the area executed in a `Unit` under a `Contract`.
#[graphql_object(context = Context)]
impl Execution {
    /// Unique identifier of this `Execution`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Execution.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `Contract` this `Execution` is made under.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Execution.contract",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn contract(&self) -> api::Contract {
        api::Contract::lazy(self.0.contract_id)
    }

    /// `Unit` this `Execution` is made in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Execution.unit",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn unit(&self, ctx: &Context) -> Result<api::Unit, Error> {
        ctx.service()
            .execute(query::unit::ById::by(self.0.unit_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::query::UnitError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Executed area, always positive.
    pub fn area(&self) -> Area {
        self.0.area
    }

    /// `Date` when the executed area was measured.
    pub fn measured_on(&self) -> Date {
        self.0.measured_on
    }

    /// Person or team responsible for this `Execution`.
    pub fn responsible(&self) -> Responsible {
        self.0.responsible.clone().into()
    }

    /// Notes about this `Execution`, if any.
    pub fn notes(&self) -> Option<api::Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// Approval of this `Execution`, if approved.
    pub fn approval(&self) -> Option<Approval> {
        self.0.approval.clone().map(Into::into)
    }

    /// `DateTime` when this `Execution` was recorded.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of an `Execution`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::execution::Id)]
#[into(domain::execution::Id)]
#[graphql(name = "ExecutionId", transparent)]
pub struct Id(Uuid);

/// Person or team responsible for an `Execution`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ExecutionResponsible",
    with = scalar::Via::<domain::execution::Responsible>,
)]
pub struct Responsible(domain::execution::Responsible);

/// Person who approved an `Execution`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ExecutionApprover",
    with = scalar::Via::<domain::execution::Approver>,
)]
pub struct Approver(domain::execution::Approver);

/// Approval of an `Execution`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "ExecutionApproval")]
pub struct Approval {
    /// Person who approved the `Execution`.
    pub approver: Approver,

    /// `DateTime` when the `Execution` was approved.
    pub approved_at: DateTime,
}

impl From<domain::execution::Approval> for Approval {
    fn from(approval: domain::execution::Approval) -> Self {
        let domain::execution::Approval {
            approver,
            approved_at,
        } = approval;
        Self {
            approver: approver.into(),
            approved_at: approved_at.coerce(),
        }
    }
}
