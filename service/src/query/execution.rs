//! [`Query`] collection related to [`Execution`]s.

use common::operations::By;

use crate::domain::{contract, Execution};
#[cfg(doc)]
use crate::{domain::Contract, Query};

use super::DatabaseQuery;

/// Queries all the [`Execution`]s of a [`Contract`], ordered by measurement
/// date.
pub type ByContract = DatabaseQuery<By<Vec<Execution>, contract::Id>>;
