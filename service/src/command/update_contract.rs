//! [`Command`] for updating an existing [`Contract`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Area, Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, Contract, Notes},
    infra::{database, Database},
    ErrorKind, Service,
};

use super::{
    create_contract::{
        validate, warn_floors_mismatch, TermsError, NUMBER_CONSTRAINT,
    },
    Command,
};

/// [`Command`] for updating the terms or the status of a [`Contract`].
///
/// Only the provided fields are changed.
#[derive(Clone, Debug, Default)]
pub struct UpdateContract {
    /// ID of the [`Contract`] to be updated.
    pub id: contract::Id,

    /// New [`contract::Number`] of the [`Contract`].
    pub number: Option<contract::Number>,

    /// New [`contract::ServiceType`] of the [`Contract`].
    pub service_type: Option<contract::ServiceType>,

    /// New total value of the [`Contract`].
    pub total_value: Option<Money>,

    /// New value of a square meter of the [`Contract`].
    pub value_per_area: Option<Option<Money>>,

    /// New total contracted [`Area`] of the [`Contract`].
    pub total_area: Option<Area>,

    /// New [`contract::AreaByFloor`] of the [`Contract`].
    pub area_by_floor: Option<contract::AreaByFloor>,

    /// New [`contract::Status`] of the [`Contract`].
    pub status: Option<contract::Status>,

    /// New [`Notes`] about the [`Contract`].
    pub notes: Option<Option<Notes>>,

    /// New [`Date`] when the work starts.
    pub starts_on: Option<Option<Date>>,

    /// New [`Date`] when the work is expected to end.
    pub expected_end_on: Option<Option<Date>>,
}

impl<Db> Command<UpdateContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Number>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateContract {
            id,
            number,
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

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications.
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

        if let Some(number) = number.filter(|n| *n != contract.number) {
            let existing = tx
                .execute(Select(By::<Option<Contract>, _>::new(number.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if existing.is_some() {
                return Err(tracerr::new!(E::NumberAlreadyExists(number)));
            }
            contract.number = number;
        }
        if let Some(service_type) = service_type {
            contract.service_type = service_type;
        }
        if let Some(total_value) = total_value {
            contract.total_value = total_value;
        }
        if let Some(value_per_area) = value_per_area {
            contract.value_per_area = value_per_area;
        }
        if let Some(total_area) = total_area {
            contract.total_area = total_area;
        }
        if let Some(area_by_floor) = area_by_floor {
            contract.area_by_floor = area_by_floor;
        }
        if let Some(status) = status {
            contract.status = status;
        }
        if let Some(notes) = notes {
            contract.notes = notes;
        }
        if let Some(starts_on) = starts_on {
            contract.starts_on = starts_on;
        }
        if let Some(expected_end_on) = expected_end_on {
            contract.expected_end_on = expected_end_on;
        }
        validate(&contract).map_err(tracerr::from_and_wrap!(=> E))?;
        contract.updated_at = DateTime::now().coerce();

        tx.execute(Update(contract.clone()))
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
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        warn_floors_mismatch(&contract);

        Ok(contract)
    }
}

/// Error of [`UpdateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Another [`Contract`] with the same [`contract::Number`] exists.
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
            Self::ContractNotExists(_) => ErrorKind::NotFound,
            Self::Db(_) => ErrorKind::Internal,
            Self::NumberAlreadyExists(_) => ErrorKind::Conflict,
            Self::Terms(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Area, Date};
    use futures::executor::block_on;

    use crate::{
        command::{create_contract::TermsError, DeleteContract},
        domain::contract,
        infra::database::memory::MemoryDb,
        Command as _,
    };

    use super::{ExecutionError, UpdateContract};

    #[test]
    fn changes_only_provided_fields() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let id = db.add_contract(development, &[(1, "100")]);
        let original = db.contracts().remove(0);

        let updated = block_on(db.service().execute(UpdateContract {
            id,
            number: contract::Number::new("CT 2024 001"),
            status: Some(contract::Status::Paused),
            total_area: Some(Area::from_str("150").unwrap()),
            area_by_floor: Some(
                contract::AreaByFloor::new([
                    (1, Area::from_str("100").unwrap()),
                    (2, Area::from_str("50").unwrap()),
                ])
                .unwrap(),
            ),
            ..UpdateContract::default()
        }))
        .unwrap();

        assert_eq!(AsRef::<str>::as_ref(&updated.number), "CT 2024 001");
        assert_eq!(updated.status, contract::Status::Paused);
        assert_eq!(updated.area_by_floor.get(2), Area::from_str("50").ok());
        assert_eq!(updated.total_value, original.total_value);
        assert_eq!(updated.service_type, original.service_type);
        assert!(updated.floors_mismatch().is_none());

        let stored = db.contracts().remove(0);
        assert_eq!(stored.number, updated.number);
        assert_eq!(stored.total_area, Area::from_str("150").unwrap());
    }

    #[test]
    fn refuses_taken_number() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let id = db.add_contract(development, &[(1, "100")]);
        let other = db.add_contract(development, &[(1, "100")]);
        let svc = db.service();
        _ = block_on(svc.execute(DeleteContract { id: other })).unwrap();

        let err = block_on(svc.execute(UpdateContract {
            id,
            number: contract::Number::new("CT-002"),
            ..UpdateContract::default()
        }))
        .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NumberAlreadyExists(n) if AsRef::<str>::as_ref(n) == "CT-002",
        ));
        assert_eq!(AsRef::<str>::as_ref(&db.contracts()[0].number), "CT-001");
    }

    #[test]
    fn refuses_invalid_terms() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let id = db.add_contract(development, &[(1, "100")]);

        let err = block_on(db.service().execute(UpdateContract {
            id,
            starts_on: Some(Date::from_calendar(2024, 6, 1).ok()),
            expected_end_on: Some(Date::from_calendar(2024, 5, 1).ok()),
            ..UpdateContract::default()
        }))
        .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Terms(TermsError::EndsBeforeStart { .. }),
        ));
        assert!(db.contracts()[0].starts_on.is_none());
    }

    #[test]
    fn hides_deleted_contract() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let id = db.add_contract(development, &[(1, "100")]);
        let svc = db.service();
        _ = block_on(svc.execute(DeleteContract { id })).unwrap();

        let err = block_on(svc.execute(UpdateContract {
            id,
            status: Some(contract::Status::Closed),
            ..UpdateContract::default()
        }))
        .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractNotExists(i) if *i == id,
        ));
        assert_eq!(db.contracts()[0].status, contract::Status::Active);
    }
}
