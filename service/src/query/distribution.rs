//! [`Query`] collection related to distribution plans.

use common::{
    operations::{By, Select},
    Area,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contract,
        distribution::{Proposal, ProposalError},
        unit, Contract, Unit,
    },
    infra::{database, Database},
    read::{self, unit::OnFloor},
    ErrorKind, Service,
};

use super::{DatabaseQuery, Query};

/// Queries the saved distribution plan of a [`Contract`].
pub type ByContract =
    DatabaseQuery<By<Vec<read::distribution::Line>, contract::Id>>;

/// Queries an equal-share [`Proposal`] for a floor of a [`Contract`],
/// without persisting it.
#[derive(Clone, Copy, Debug)]
pub struct Preview {
    /// ID of the [`Contract`] to distribute the area of.
    pub contract_id: contract::Id,

    /// Floor to distribute the contracted area of.
    pub floor: unit::Floor,

    /// Whether hall [`Unit`]s should receive a part of the floor area.
    pub include_hall: bool,

    /// [`Area`] reserved for the hall [`Unit`]s.
    ///
    /// Only taken into account when `include_hall` is set.
    pub hall_area: Option<Area>,
}

impl<Db> Query<Preview> for Service<Db>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Unit>, OnFloor>>,
            Ok = Vec<Unit>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Proposal;
    type Err = Traced<PreviewError>;

    async fn execute(&self, query: Preview) -> Result<Self::Ok, Self::Err> {
        use PreviewError as E;

        let Preview {
            contract_id,
            floor,
            include_hall,
            hall_area,
        } = query;

        let contract = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| !c.is_deleted())
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let floor_area = contract
            .area_by_floor
            .get(floor)
            .ok_or(E::FloorNotContracted(floor))
            .map_err(tracerr::wrap!())?;

        let apartments = self
            .database()
            .execute(Select(By::new(OnFloor {
                development_id: contract.development_id,
                floor,
                kind: unit::Kind::Apartment,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let halls = match hall_area.filter(|_| include_hall) {
            Some(area) => Some((
                area,
                self.database()
                    .execute(Select(By::new(OnFloor {
                        development_id: contract.development_id,
                        floor,
                        kind: unit::Kind::Hall,
                    })))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?,
            )),
            None => None,
        };

        Proposal::equal_shares(
            floor,
            floor_area,
            &apartments,
            halls.as_ref().map(|(area, units)| (*area, units.as_slice())),
        )
        .map_err(tracerr::from_and_wrap!(=> E))
    }
}

/// Error of [`Preview`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum PreviewError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Floor has no contracted [`Area`].
    #[display("Floor {_0} is not contracted")]
    FloorNotContracted(#[error(not(source))] unit::Floor),

    /// [`Proposal`] cannot be made.
    #[display("Cannot distribute the floor: {_0}")]
    #[from]
    Proposal(ProposalError),
}

impl PreviewError {
    /// Returns the [`ErrorKind`] of this [`PreviewError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ContractNotExists(_)
            | Self::FloorNotContracted(_)
            | Self::Proposal(
                ProposalError::NoApartments | ProposalError::NoHall,
            ) => ErrorKind::NotFound,
            Self::Proposal(ProposalError::HallExceedsFloor { .. }) => {
                ErrorKind::Validation
            }
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
        command::DeleteContract,
        domain::{block, contract, distribution::ProposalError, unit},
        infra::database::memory::MemoryDb,
        Query as _,
    };

    use super::{Preview, PreviewError};

    /// Prepares a [`MemoryDb`] with 2 one-floor `Block`s of 2 apartments
    /// and a hall each, and a `Contract` over floors 1 and 2.
    fn setup() -> (MemoryDb, contract::Id) {
        let db = MemoryDb::default();
        let development = db.add_development();
        for _ in 0..2 {
            let block = db.add_block(
                development,
                block::Layout::new(1, 2, true, 1).unwrap(),
            );
            _ = db.generate_units(block);
        }
        let contract = db.add_contract(development, &[(1, "120"), (2, "50")]);
        (db, contract)
    }

    fn preview(
        contract_id: contract::Id,
        floor: unit::Floor,
        hall_area: Option<&str>,
    ) -> Preview {
        Preview {
            contract_id,
            floor,
            include_hall: hall_area.is_some(),
            hall_area: hall_area.map(|a| Area::from_str(a).unwrap()),
        }
    }

    fn area(s: &str) -> Area {
        Area::from_str(s).unwrap()
    }

    #[test]
    fn shares_floor_across_apartments() {
        let (db, contract) = setup();

        let proposal =
            block_on(db.service().execute(preview(contract, 1, None)))
                .unwrap();

        assert_eq!(proposal.floor, 1);
        assert_eq!(proposal.floor_area, area("120"));
        assert_eq!(
            proposal
                .allocations
                .iter()
                .map(|a| (a.block_name.to_string(), a.label.to_string()))
                .collect::<Vec<_>>(),
            [
                ("Block 01".to_owned(), "101".to_owned()),
                ("Block 01".to_owned(), "102".to_owned()),
                ("Block 02".to_owned(), "101".to_owned()),
                ("Block 02".to_owned(), "102".to_owned()),
            ],
        );
        assert!(proposal.allocations.iter().all(|a| a.area == area("30")));
    }

    #[test]
    fn reserves_hall_area() {
        let (db, contract) = setup();
        let svc = db.service();

        let proposal =
            block_on(svc.execute(preview(contract, 1, Some("20")))).unwrap();

        let (halls, apartments): (Vec<_>, Vec<_>) = proposal
            .allocations
            .iter()
            .partition(|a| a.kind == unit::Kind::Hall);
        assert_eq!(apartments.len(), 4);
        assert!(apartments.iter().all(|a| a.area == area("25")));
        assert_eq!(halls.len(), 2);
        assert!(halls.iter().all(|a| a.area == area("10")));
        assert!(halls.iter().all(|a| a.label.to_string() == "Hall"));
        assert_eq!(proposal.allocated(), area("120"));

        let ignored = block_on(svc.execute(Preview {
            include_hall: false,
            ..preview(contract, 1, Some("20"))
        }))
        .unwrap();
        assert_eq!(ignored.allocations.len(), 4);

        let err = block_on(svc.execute(preview(contract, 1, Some("130"))))
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            PreviewError::Proposal(ProposalError::HallExceedsFloor { .. }),
        ));
    }

    #[test]
    fn refuses_floor_without_area_or_apartments() {
        let (db, contract) = setup();
        let svc = db.service();

        let err = block_on(svc.execute(preview(contract, 3, None)))
            .unwrap_err();
        assert!(matches!(err.as_ref(), PreviewError::FloorNotContracted(3)));

        let err = block_on(svc.execute(preview(contract, 2, None)))
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            PreviewError::Proposal(ProposalError::NoApartments),
        ));
    }

    #[test]
    fn hides_deleted_contract() {
        let (db, contract) = setup();
        let svc = db.service();
        _ = block_on(svc.execute(DeleteContract { id: contract })).unwrap();

        let err = block_on(svc.execute(preview(contract, 1, None)))
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            PreviewError::ContractNotExists(id) if *id == contract,
        ));
    }
}
