//! [`Query`] collection related to [`Unit`]s.

use common::operations::By;

use crate::domain::{development, unit, Unit};
#[cfg(doc)]
use crate::{domain::Development, Query};

use super::DatabaseQuery;

/// Queries all the [`Unit`]s of a [`Development`], ordered by block name,
/// floor and label.
pub type ByDevelopment = DatabaseQuery<By<Vec<Unit>, development::Id>>;

/// Queries a [`Unit`] by its ID.
pub type ById = DatabaseQuery<By<Option<Unit>, unit::Id>>;
