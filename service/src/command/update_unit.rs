//! [`Command`] for editing a [`Unit`].

use common::{
    operations::{By, Select, Update},
    Area,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{unit, Notes, Unit},
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for editing the descriptive fields of a [`Unit`].
///
/// The provided values replace the current ones, so [`None`] clears a
/// field.
#[derive(Clone, Debug)]
pub struct UpdateUnit {
    /// ID of the [`Unit`] to be updated.
    pub id: unit::Id,

    /// New [`unit::Typology`] of the [`Unit`].
    pub typology: Option<unit::Typology>,

    /// New total [`Area`] of the [`Unit`].
    pub total_area: Option<Area>,

    /// New [`Notes`] about the [`Unit`].
    pub notes: Option<Notes>,
}

impl<Db> Command<UpdateUnit> for Service<Db>
where
    Db: Database<
            Select<By<Option<Unit>, unit::Id>>,
            Ok = Option<Unit>,
            Err = Traced<database::Error>,
        > + Database<Update<Unit>, Err = Traced<database::Error>>,
{
    type Ok = Unit;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateUnit) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUnit {
            id,
            typology,
            total_area,
            notes,
        } = cmd;

        let mut unit = self
            .database()
            .execute(Select(By::<Option<Unit>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UnitNotExists(id))
            .map_err(tracerr::wrap!())?;

        unit.typology = typology;
        unit.total_area = total_area;
        unit.notes = notes;

        self.database()
            .execute(Update(unit.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(unit)
    }
}

/// Error of [`UpdateUnit`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

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
            Self::UnitNotExists(_) => ErrorKind::NotFound,
        }
    }
}
