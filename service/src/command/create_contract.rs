//! [`Command`] for creating a new [`Contract`].

use common::{
    operations::{By, Insert, Select},
    Area, Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, development, Contract, Development, Notes},
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// Name of the constraint keeping [`contract::Number`]s unique.
pub(crate) const NUMBER_CONSTRAINT: &str = "contracts_number_key";

/// [`Command`] for creating a new [`Contract`].
#[derive(Clone, Debug)]
pub struct CreateContract {
    /// [`contract::Number`] of a new [`Contract`].
    pub number: contract::Number,

    /// ID of the [`Development`] a new [`Contract`] is executed in.
    pub development_id: development::Id,

    /// [`contract::ServiceType`] of a new [`Contract`].
    pub service_type: contract::ServiceType,

    /// Total value of a new [`Contract`].
    pub total_value: Money,

    /// Value of a square meter of a new [`Contract`].
    pub value_per_area: Option<Money>,

    /// Total contracted [`Area`] of a new [`Contract`].
    pub total_area: Area,

    /// [`contract::AreaByFloor`] of a new [`Contract`].
    pub area_by_floor: contract::AreaByFloor,

    /// [`contract::Status`] of a new [`Contract`].
    pub status: contract::Status,

    /// [`Notes`] about a new [`Contract`].
    pub notes: Option<Notes>,

    /// [`Date`] when the work starts.
    pub starts_on: Option<Date>,

    /// [`Date`] when the work is expected to end.
    pub expected_end_on: Option<Date>,
}

impl<Db> Command<CreateContract> for Service<Db>
where
    Db: Database<
            Select<By<Option<Development>, development::Id>>,
            Ok = Option<Development>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Number>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract {
            number,
            development_id,
            service_type,
            total_value,
            value_per_area,
            total_area,
            area_by_floor,
            status,
            notes,
            starts_on,
            expected_end_on,
        } = cmd;

        let now = DateTime::now();
        let contract = Contract {
            id: contract::Id::new(),
            number,
            development_id,
            service_type,
            total_value,
            value_per_area,
            total_area,
            area_by_floor,
            status,
            notes,
            starts_on,
            expected_end_on,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        };
        validate(&contract).map_err(tracerr::from_and_wrap!(=> E))?;

        self.database()
            .execute(Select(By::<Option<Development>, _>::new(development_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DevelopmentNotExists(development_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let existing = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(
                contract.number.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::NumberAlreadyExists(contract.number)));
        }

        self.database()
            .execute(Insert(contract.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(Some(NUMBER_CONSTRAINT)) {
                    tracerr::new!(E::NumberAlreadyExists(
                        contract.number.clone()
                    ))
                } else {
                    (tracerr::map_from_and_wrap!(=> E))(e)
                }
            })
            .map(drop)?;

        warn_floors_mismatch(&contract);

        Ok(contract)
    }
}

/// Validates the terms of the provided [`Contract`].
///
/// # Errors
///
/// With the first broken term found.
pub(crate) fn validate(contract: &Contract) -> Result<(), TermsError> {
    use TermsError as E;

    if contract.total_area.is_zero() {
        return Err(E::NonPositiveTotalArea);
    }
    if contract.total_value.is_negative() {
        return Err(E::NegativeValue);
    }
    if contract.value_per_area.is_some_and(|v| v.is_negative()) {
        return Err(E::NegativeValue);
    }
    if let (Some(start), Some(end)) =
        (contract.starts_on, contract.expected_end_on)
    {
        if end < start {
            return Err(E::EndsBeforeStart { start, end });
        }
    }
    Ok(())
}

/// Logs a warning if the [`contract::AreaByFloor`] of the provided
/// [`Contract`] doesn't sum up to its total [`Area`].
pub(crate) fn warn_floors_mismatch(contract: &Contract) {
    if let Some(diff) = contract.floors_mismatch() {
        log::warn!(
            "floors of `Contract(number: {})` sum to {} instead of {} \
             (difference: {diff})",
            contract.number,
            contract.area_by_floor.total(),
            contract.total_area,
        );
    }
}

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Development`] with the provided ID does not exist.
    #[display("`Development(id: {_0})` does not exist")]
    DevelopmentNotExists(#[error(not(source))] development::Id),

    /// [`Contract`] with the same [`contract::Number`] already exists.
    #[display("`Contract(number: {_0})` already exists")]
    NumberAlreadyExists(#[error(not(source))] contract::Number),

    /// [`Contract`] terms are invalid.
    #[display("Invalid `Contract` terms: {_0}")]
    #[from]
    Terms(TermsError),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::DevelopmentNotExists(_) => ErrorKind::NotFound,
            Self::NumberAlreadyExists(_) => ErrorKind::Conflict,
            Self::Terms(_) => ErrorKind::Validation,
        }
    }
}

/// Error of [`Contract`] terms validation.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum TermsError {
    /// Expected end [`Date`] precedes the start [`Date`].
    #[display("expected end {end} precedes start {start}")]
    EndsBeforeStart {
        /// Start [`Date`].
        start: Date,

        /// Expected end [`Date`].
        end: Date,
    },

    /// Some of the [`Money`] values is negative.
    #[display("value cannot be negative")]
    NegativeValue,

    /// Total [`Area`] is zero.
    #[display("total area must be positive")]
    NonPositiveTotalArea,
}
