//! [`Command`] for recording an [`Execution`].

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Select},
    Area, Date, DateTime, Percent,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract, distribution, execution, unit, Contract, Execution, Notes,
        Unit,
    },
    infra::{database, Database},
    read::contract::ExecutedArea,
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for recording the [`Area`] executed in a [`Unit`] under a
/// [`Contract`].
///
/// The [`Unit`] must be a part of the [`Contract`] distribution plan.
/// Executing more than contracted is allowed.
#[derive(Clone, Debug)]
pub struct RecordExecution {
    /// ID of the [`Contract`] the work is executed under.
    pub contract_id: contract::Id,

    /// ID of the [`Unit`] the work is executed in.
    pub unit_id: unit::Id,

    /// Executed area, in square meters.
    pub area: Decimal,

    /// [`Date`] when the executed area was measured.
    pub measured_on: Option<Date>,

    /// [`execution::Responsible`] for the work.
    pub responsible: execution::Responsible,

    /// [`Notes`] about the work.
    pub notes: Option<Notes>,
}

impl<Db> Command<RecordExecution> for Service<Db>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Unit>, unit::Id>>,
            Ok = Option<Unit>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<Option<distribution::Entry>, (contract::Id, unit::Id)>,
            >,
            Ok = Option<distribution::Entry>,
            Err = Traced<database::Error>,
        > + Database<Insert<Execution>, Err = Traced<database::Error>>
        + Database<
            Select<By<HashMap<contract::Id, ExecutedArea>, [contract::Id; 1]>>,
            Ok = HashMap<contract::Id, ExecutedArea>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Execution;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordExecution,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordExecution {
            contract_id,
            unit_id,
            area,
            measured_on,
            responsible,
            notes,
        } = cmd;

        let area = Area::positive(area)
            .ok_or(E::InvalidArea(area))
            .map_err(tracerr::wrap!())?;
        let measured_on = measured_on
            .ok_or(E::NoMeasurementDate)
            .map_err(tracerr::wrap!())?;

        let contract = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| !c.is_deleted())
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let unit = self
            .database()
            .execute(Select(By::<Option<Unit>, _>::new(unit_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UnitNotExists(unit_id))
            .map_err(tracerr::wrap!())?;
        if unit.development_id != contract.development_id {
            return Err(tracerr::new!(E::UnitNotDistributed(unit_id)));
        }

        self.database()
            .execute(Select(By::<Option<distribution::Entry>, _>::new((
                contract_id,
                unit_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UnitNotDistributed(unit_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        // Read before inserting, so the append is the last fallible step.
        let ExecutedArea(executed) = self
            .database()
            .execute(Select(
                By::<HashMap<contract::Id, ExecutedArea>, _>::new([
                    contract_id,
                ]),
            ))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .remove(&contract_id)
            .unwrap_or_default();

        let execution = Execution {
            id: execution::Id::new(),
            contract_id,
            unit_id,
            area,
            measured_on,
            responsible,
            notes,
            approval: None,
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(execution.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let executed = executed + area;
        let percent = Percent::of(executed, contract.total_area);
        if percent.is_overflown() {
            log::warn!(
                "`Contract(number: {})` is over-executed: {executed} of {} \
                 ({percent}%)",
                contract.number,
                contract.total_area,
            );
        }

        Ok(execution)
    }
}

/// Error of [`RecordExecution`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Executed area is not positive, or exceeds [`Area::MAX`].
    #[display(
        "Executed area must be positive and not exceed {}, but is {_0}",
        Area::MAX,
    )]
    InvalidArea(#[error(not(source))] Decimal),

    /// Measurement [`Date`] is not provided.
    #[display("Measurement date is required")]
    NoMeasurementDate,

    /// [`Unit`] is not a part of the [`Contract`] distribution plan.
    #[display("`Unit(id: {_0})` is not distributed in the `Contract`")]
    UnitNotDistributed(#[error(not(source))] unit::Id),

    /// [`Unit`] with the provided ID does not exist.
    #[display("`Unit(id: {_0})` does not exist")]
    UnitNotExists(#[error(not(source))] unit::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ContractNotExists(_) | Self::UnitNotExists(_) => {
                ErrorKind::NotFound
            }
            Self::Db(_) => ErrorKind::Internal,
            Self::InvalidArea(_)
            | Self::NoMeasurementDate
            | Self::UnitNotDistributed(_) => ErrorKind::Validation,
        }
    }
}
