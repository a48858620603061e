//! [`Command`] for approving an [`Execution`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        execution::{self, Approval},
        Execution,
    },
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for approving an [`Execution`].
///
/// Approval is one-way: an approved [`Execution`] cannot be approved again.
#[derive(Clone, Debug)]
pub struct ApproveExecution {
    /// ID of the [`Execution`] to be approved.
    pub id: execution::Id,

    /// [`execution::Approver`] of the [`Execution`].
    pub approver: execution::Approver,
}

impl<Db> Command<ApproveExecution> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Execution, execution::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Execution>, execution::Id>>,
            Ok = Option<Execution>,
            Err = Traced<database::Error>,
        > + Database<Update<Execution>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Execution;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ApproveExecution { id, approver }: ApproveExecution,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Execution, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut execution = tx
            .execute(Select(By::<Option<Execution>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ExecutionNotExists(id))
            .map_err(tracerr::wrap!())?;
        if execution.is_approved() {
            return Err(tracerr::new!(E::AlreadyApproved(id)));
        }

        execution.approval = Some(Approval {
            approver,
            approved_at: DateTime::now().coerce(),
        });

        tx.execute(Update(execution.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(execution)
    }
}

/// Error of [`ApproveExecution`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Execution`] is approved already.
    #[display("`Execution(id: {_0})` is approved already")]
    AlreadyApproved(#[error(not(source))] execution::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Execution`] with the provided ID does not exist.
    #[display("`Execution(id: {_0})` does not exist")]
    ExecutionNotExists(#[error(not(source))] execution::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyApproved(_) => ErrorKind::Conflict,
            Self::Db(_) => ErrorKind::Internal,
            Self::ExecutionNotExists(_) => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Area, Date};
    use futures::executor::block_on;
    use rust_decimal::Decimal;

    use crate::{
        command::{
            save_distribution::NewEntry, RecordExecution, SaveDistribution,
        },
        domain::{
            block,
            execution::{self, Approver, Responsible},
            Execution,
        },
        infra::database::memory::MemoryDb,
        Command as _,
    };

    use super::{ApproveExecution, ExecutionError};

    /// Records a single [`Execution`] in a fresh [`MemoryDb`].
    fn setup() -> (MemoryDb, Execution) {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(
            development,
            block::Layout::new(1, 1, false, 0).unwrap(),
        );
        let units = db.generate_units(block);
        let contract = db.add_contract(development, &[(1, "80")]);
        let svc = db.service();
        _ = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: vec![NewEntry {
                unit_id: units[0],
                area: Area::from_str("80").unwrap(),
                coefficient: None,
            }],
        }))
        .unwrap();
        let execution = block_on(svc.execute(RecordExecution {
            contract_id: contract,
            unit_id: units[0],
            area: Decimal::from(80),
            measured_on: Some(Date::from_calendar(2024, 6, 3).unwrap()),
            responsible: Responsible::new("Equipe Costa").unwrap(),
            notes: None,
        }))
        .unwrap();
        (db, execution)
    }

    #[test]
    fn approves_once() {
        let (db, execution) = setup();
        let svc = db.service();
        let approver = Approver::new("Eng. Marta Lima").unwrap();

        let approved = block_on(svc.execute(ApproveExecution {
            id: execution.id,
            approver: approver.clone(),
        }))
        .unwrap();
        assert_eq!(
            approved.approval.as_ref().map(|a| &a.approver),
            Some(&approver),
        );

        let stored = db.executions_of(execution.contract_id);
        assert!(stored[0].is_approved());

        let err = block_on(svc.execute(ApproveExecution {
            id: execution.id,
            approver,
        }))
        .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyApproved(_)));
        assert_eq!(err.as_ref().kind(), crate::ErrorKind::Conflict);
    }

    #[test]
    fn requires_existing_execution() {
        let (db, _) = setup();

        let err = block_on(db.service().execute(ApproveExecution {
            id: execution::Id::new(),
            approver: Approver::new("Eng. Marta Lima").unwrap(),
        }))
        .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ExecutionNotExists(_)));
    }
}
