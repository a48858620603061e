//! [`Development`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A construction project.
#[derive(Clone, Debug, From)]
pub struct Development(domain::Development);

/// A construction project made of one or more `Block`s.
#[graphql_object(context = Context)]
impl Development {
    /// Unique identifier of this `Development`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Development.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of this `Development`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Development.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// Notes about this `Development`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Development.notes",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn notes(&self) -> Option<api::Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// Indicator whether this `Development` is active.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Development.isActive",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn is_active(&self) -> bool {
        self.0.is_active
    }

    /// `Block`s of this `Development`, ordered by name.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Development.blocks",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn blocks(&self, ctx: &Context) -> Result<Vec<api::Block>, Error> {
        ctx.service()
            .execute(query::block::ByDevelopment::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|blocks| blocks.into_iter().map(Into::into).collect())
    }

    /// `Unit`s of this `Development`, ordered by `Block` name, floor and
    /// label.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Development.units",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn units(&self, ctx: &Context) -> Result<Vec<api::Unit>, Error> {
        ctx.service()
            .execute(query::unit::ByDevelopment::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|units| units.into_iter().map(Into::into).collect())
    }

    /// `DateTime` when this `Development` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Development.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Development`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::development::Id)]
#[into(domain::development::Id)]
#[graphql(name = "DevelopmentId", transparent)]
pub struct Id(Uuid);

/// Name of a `Development`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DevelopmentName",
    with = scalar::Via::<domain::development::Name>,
)]
pub struct Name(domain::development::Name);
