//! [`Query`] collection related to [`Block`]s.

use common::operations::By;

use crate::domain::{development, Block};
#[cfg(doc)]
use crate::{domain::Development, Query};

use super::DatabaseQuery;

/// Queries all the [`Block`]s of a [`Development`], ordered by name.
pub type ByDevelopment = DatabaseQuery<By<Vec<Block>, development::Id>>;
