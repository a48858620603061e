//! [`Command`] for creating a [`Unit`] manually.

use common::{
    operations::{By, Insert, Select},
    Area, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{block, unit, Block, Notes, Unit},
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// Name of the constraint keeping [`unit::Address`]es unique.
pub(crate) const ADDRESS_CONSTRAINT: &str = "units_address_key";

/// [`Command`] for creating a [`Unit`] manually, for irregular [`Block`]
/// layouts not covered by the generation.
#[derive(Clone, Debug)]
pub struct CreateUnit {
    /// ID of the [`Block`] to create a [`Unit`] in.
    pub block_id: block::Id,

    /// Floor of a new [`Unit`].
    pub floor: unit::Floor,

    /// [`unit::Label`] of a new [`Unit`].
    pub label: unit::Label,

    /// [`unit::Kind`] of a new [`Unit`].
    pub kind: unit::Kind,

    /// [`unit::Typology`] of a new [`Unit`].
    pub typology: Option<unit::Typology>,

    /// Total [`Area`] of a new [`Unit`].
    pub total_area: Option<Area>,

    /// [`Notes`] about a new [`Unit`].
    pub notes: Option<Notes>,
}

impl<Db> Command<CreateUnit> for Service<Db>
where
    Db: Database<
            Select<By<Option<Block>, block::Id>>,
            Ok = Option<Block>,
            Err = Traced<database::Error>,
        > + Database<Insert<Unit>, Err = Traced<database::Error>>,
{
    type Ok = Unit;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUnit) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUnit {
            block_id,
            floor,
            label,
            kind,
            typology,
            total_area,
            notes,
        } = cmd;

        let block = self
            .database()
            .execute(Select(By::<Option<Block>, _>::new(block_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BlockNotExists(block_id))
            .map_err(tracerr::wrap!())?;

        if !block.layout.contains_floor(floor) {
            return Err(tracerr::new!(E::FloorOutOfRange {
                floor,
                floor_count: block.layout.floor_count(),
            }));
        }

        let unit = Unit {
            id: unit::Id::new(),
            development_id: block.development_id,
            block_id,
            block_name: block.name,
            floor,
            label,
            kind,
            typology,
            total_area,
            notes,
            created_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(unit.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(Some(ADDRESS_CONSTRAINT)) {
                    tracerr::new!(E::UnitAlreadyExists {
                        floor: unit.floor,
                        label: unit.label.clone(),
                    })
                } else {
                    (tracerr::map_from_and_wrap!(=> E))(e)
                }
            })
            .map(drop)?;

        Ok(unit)
    }
}

/// Error of [`CreateUnit`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Block`] with the provided ID does not exist.
    #[display("`Block(id: {_0})` does not exist")]
    BlockNotExists(#[error(not(source))] block::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Floor is outside of the [`Block`].
    #[display("Floor {floor} is out of `1..={floor_count}` range")]
    FloorOutOfRange {
        /// Requested floor.
        floor: unit::Floor,

        /// Number of floors in the [`Block`].
        floor_count: u16,
    },

    /// [`Unit`] with the same address already exists in the [`Block`].
    #[display("`Unit(label: {label})` already exists on floor {floor}")]
    UnitAlreadyExists {
        /// Floor of the [`Unit`].
        floor: unit::Floor,

        /// [`unit::Label`] of the [`Unit`].
        label: unit::Label,
    },
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BlockNotExists(_) => ErrorKind::NotFound,
            Self::Db(_) => ErrorKind::Internal,
            Self::FloorOutOfRange { .. } => ErrorKind::Validation,
            Self::UnitAlreadyExists { .. } => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use futures::executor::block_on;

    use crate::{
        domain::{block, unit},
        infra::database::memory::MemoryDb,
        Command as _,
    };

    use super::{CreateUnit, ExecutionError};

    fn unit(block_id: block::Id, floor: unit::Floor, label: &str) -> CreateUnit {
        CreateUnit {
            block_id,
            floor,
            label: unit::Label::new(label).unwrap(),
            kind: unit::Kind::Apartment,
            typology: None,
            total_area: None,
            notes: None,
        }
    }

    #[test]
    fn creates_irregular_unit() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(
            development,
            block::Layout::new(2, 1, false, 0).unwrap(),
        );
        _ = db.generate_units(block);

        let created =
            block_on(db.service().execute(unit(block, 2, "2A"))).unwrap();

        assert_eq!(created.block_id, block);
        assert_eq!(created.development_id, development);
        assert_eq!(created.block_name.to_string(), "Block 01");
        assert!(db.units().iter().any(|u| u.id == created.id));
        assert_eq!(db.units().len(), 3);
    }

    #[test]
    fn refuses_duplicate_address() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(
            development,
            block::Layout::new(2, 1, false, 0).unwrap(),
        );
        _ = db.generate_units(block);
        let svc = db.service();

        for (floor, label) in [(1, "101"), (2, "201")] {
            let err =
                block_on(svc.execute(unit(block, floor, label))).unwrap_err();
            assert!(matches!(
                err.as_ref(),
                ExecutionError::UnitAlreadyExists { floor: f, label: l }
                    if *f == floor && l.to_string() == label,
            ));
        }

        _ = block_on(svc.execute(unit(block, 1, "1A"))).unwrap();
        let err = block_on(svc.execute(unit(block, 1, "1A"))).unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::UnitAlreadyExists { .. },
        ));
        assert_eq!(db.units().len(), 3);
    }

    #[test]
    fn requires_floor_of_block() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(
            development,
            block::Layout::new(2, 1, false, 0).unwrap(),
        );
        let svc = db.service();

        for floor in [0, 3] {
            let err =
                block_on(svc.execute(unit(block, floor, "X"))).unwrap_err();
            assert!(matches!(
                err.as_ref(),
                ExecutionError::FloorOutOfRange { floor: f, floor_count: 2 }
                    if *f == floor,
            ));
        }

        let err = block_on(svc.execute(unit(block::Id::new(), 1, "X")))
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::BlockNotExists(_)));
        assert!(db.units().is_empty());
    }
}
