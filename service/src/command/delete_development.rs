//! [`Command`] for deleting a [`Development`].

use common::operations::{By, Delete, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{development, Development},
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Development`] along with everything built
/// upon it: its `Block`s, `Unit`s, `Contract`s, distribution plans and
/// `Execution`s.
#[derive(Clone, Copy, Debug)]
pub struct DeleteDevelopment {
    /// ID of the [`Development`] to be deleted.
    pub id: development::Id,
}

impl<Db> Command<DeleteDevelopment> for Service<Db>
where
    Db: Database<
            Select<By<Option<Development>, development::Id>>,
            Ok = Option<Development>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Development, development::Id>>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Development;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteDevelopment { id }: DeleteDevelopment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let development = self
            .database()
            .execute(Select(By::<Option<Development>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DevelopmentNotExists(id))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Delete(By::<Development, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("deleted `Development(id: {id})` with all its contents");

        Ok(development)
    }
}

/// Error of [`DeleteDevelopment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Development`] with the provided ID does not exist.
    #[display("`Development(id: {_0})` does not exist")]
    DevelopmentNotExists(#[error(not(source))] development::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::DevelopmentNotExists(_) => ErrorKind::NotFound,
        }
    }
}
