//! GraphQL API definitions.

pub mod block;
pub mod contract;
pub mod development;
pub mod distribution;
pub mod execution;
mod mutation;
mod query;
pub mod scalar;
pub mod unit;

use derive_more::{AsRef, Display, From, Into};
use juniper::{EmptySubscription, GraphQLScalar};
use service::domain;

use crate::{define_error, Context, Error};

pub use self::{
    block::Block, contract::Contract, development::Development,
    execution::Execution, mutation::Mutation, query::Query, unit::Unit,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

/// Creates a new [`Schema`].
#[must_use]
pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}

/// Free-form notes attached to an entity.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "Notes", with = scalar::Via::<domain::Notes>)]
pub struct Notes(domain::Notes);

define_error! {
    enum InputError {
        #[code = "INVALID_FLOOR"]
        #[status = BAD_REQUEST]
        #[message = "Floor must be a positive number not greater than 65535"]
        Floor,

        #[code = "INVALID_COUNT"]
        #[status = BAD_REQUEST]
        #[message = "Count must be a non-negative number not greater than \
                     65535"]
        Count,
    }
}

/// Converts the provided GraphQL `Int` into a floor number.
///
/// # Errors
///
/// With [`InputError::Floor`] if the `floor` is not positive or doesn't fit
/// into [`domain::unit::Floor`].
pub(crate) fn floor(floor: i32) -> Result<domain::unit::Floor, Error> {
    domain::unit::Floor::try_from(floor)
        .ok()
        .filter(|f| *f > 0)
        .ok_or_else(|| InputError::Floor.into())
}

/// Converts the provided GraphQL `Int` into a count of something.
///
/// # Errors
///
/// With [`InputError::Count`] if the `count` is negative or doesn't fit into
/// a [`u16`].
pub(crate) fn count(count: i32) -> Result<u16, Error> {
    u16::try_from(count).map_err(|_| InputError::Count.into())
}
