//! [`Command`] for deleting a [`Unit`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{unit, Unit},
    infra::{database, Database},
    read::unit::{DistributedIn, HasExecutions},
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Unit`] along with its distribution entries.
///
/// [`Unit`]s with recorded executions cannot be deleted.
#[derive(Clone, Copy, Debug)]
pub struct DeleteUnit {
    /// ID of the [`Unit`] to be deleted.
    pub id: unit::Id,
}

impl<Db> Command<DeleteUnit> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Vec<Unit>, [unit::Id; 1]>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Unit>, unit::Id>>,
            Ok = Option<Unit>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HasExecutions, [unit::Id; 1]>>,
            Ok = HasExecutions,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<DistributedIn, [unit::Id; 1]>>,
            Ok = DistributedIn,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Vec<Unit>, [unit::Id; 1]>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Unit;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteUnit { id }: DeleteUnit,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Hold back executions being recorded for the `Unit` meanwhile.
        tx.execute(Lock(By::<Vec<Unit>, _>::new([id])))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let unit = tx
            .execute(Select(By::<Option<Unit>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UnitNotExists(id))
            .map_err(tracerr::wrap!())?;

        let has_executions = tx
            .execute(Select(By::<HasExecutions, _>::new([id])))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *has_executions {
            return Err(tracerr::new!(E::UnitHasExecutions(id)));
        }

        let DistributedIn(contracts) = tx
            .execute(Select(By::<DistributedIn, _>::new([id])))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<Vec<Unit>, _>::new([id])))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if !contracts.is_empty() {
            log::warn!(
                "deleted `Unit(label: {}, floor: {})` of `Block(name: {})` \
                 was distributed in `Contract`s {}, so their plans no longer \
                 cover the contracted floor areas",
                unit.label,
                unit.floor,
                unit.block_name,
                contracts
                    .iter()
                    .map(AsRef::<str>::as_ref)
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }

        Ok(unit)
    }
}

/// Error of [`DeleteUnit`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Unit`] has recorded executions.
    #[display("`Unit(id: {_0})` has recorded executions")]
    UnitHasExecutions(#[error(not(source))] unit::Id),

    /// [`Unit`] with the provided ID does not exist.
    #[display("`Unit(id: {_0})` does not exist")]
    UnitNotExists(#[error(not(source))] unit::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::UnitHasExecutions(_) => ErrorKind::Conflict,
            Self::UnitNotExists(_) => ErrorKind::NotFound,
        }
    }
}
