//! [`Command`] for deleting a [`Contract`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, Contract},
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Contract`].
///
/// The [`Contract`] is only marked as deleted, so its number stays taken and
/// its distribution plan and executions are kept.
#[derive(Clone, Copy, Debug)]
pub struct DeleteContract {
    /// ID of the [`Contract`] to be deleted.
    pub id: contract::Id,
}

impl<Db> Command<DeleteContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteContract { id }: DeleteContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent deletions.
        tx.execute(Lock(By::<Contract, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| !c.is_deleted())
            .ok_or(E::ContractNotExists(id))
            .map_err(tracerr::wrap!())?;

        _ = contract.deleted_at.replace(DateTime::now().coerce());

        tx.execute(Update(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contract)
    }
}

/// Error of [`DeleteContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ContractNotExists(_) => ErrorKind::NotFound,
            Self::Db(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Area;
    use futures::executor::block_on;

    use crate::{
        command::{
            save_distribution::{self, NewEntry},
            SaveDistribution,
        },
        domain::{block, contract, unit},
        infra::database::memory::MemoryDb,
        Command as _,
    };

    use super::{DeleteContract, ExecutionError};

    fn plan(contract_id: contract::Id, units: &[unit::Id]) -> SaveDistribution {
        SaveDistribution {
            contract_id,
            entries: units
                .iter()
                .map(|id| NewEntry {
                    unit_id: *id,
                    area: Area::from_str("50").unwrap(),
                    coefficient: None,
                })
                .collect(),
        }
    }

    #[test]
    fn marks_contract_deleted_keeping_its_plan() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(
            development,
            block::Layout::new(1, 2, false, 0).unwrap(),
        );
        let units = db.generate_units(block);
        let id = db.add_contract(development, &[(1, "100")]);
        let svc = db.service();
        _ = block_on(svc.execute(plan(id, &units))).unwrap();

        let deleted = block_on(svc.execute(DeleteContract { id })).unwrap();

        assert!(deleted.is_deleted());
        assert!(db.contracts()[0].is_deleted());
        assert_eq!(db.plan_of(id).len(), 2);

        let err = block_on(svc.execute(DeleteContract { id })).unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractNotExists(i) if *i == id,
        ));

        let err = block_on(svc.execute(plan(id, &units))).unwrap_err();
        assert!(matches!(
            err.as_ref(),
            save_distribution::ExecutionError::ContractNotExists(_),
        ));
    }

    #[test]
    fn fails_on_unknown_contract() {
        let db = MemoryDb::default();

        let err = block_on(db.service().execute(DeleteContract {
            id: contract::Id::new(),
        }))
        .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ContractNotExists(_)));
    }
}
