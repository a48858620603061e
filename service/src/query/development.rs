//! [`Query`] collection related to [`Development`]s.

use common::operations::By;

use crate::{
    domain::{development, Development},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Development`] by its ID.
pub type ById = DatabaseQuery<By<Option<Development>, development::Id>>;

/// Queries a list of [`Development`]s.
pub type List = DatabaseQuery<By<Vec<Development>, read::development::Filter>>;
