//! [`Command`] for replacing the distribution plan of a [`Contract`].

use std::collections::{HashMap, HashSet};

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted,
    },
    Area,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract,
        distribution::{check_plan, Coefficient, Entry, Violation},
        unit, Contract, Unit,
    },
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for replacing the whole distribution plan of a [`Contract`].
///
/// The new plan must cover every contracted floor. It is replaced
/// atomically: either all the new [`Entry`]s become visible, or the previous
/// plan stays intact.
#[derive(Clone, Debug)]
pub struct SaveDistribution {
    /// ID of the [`Contract`] to replace the plan of.
    pub contract_id: contract::Id,

    /// [`NewEntry`]s of the new plan.
    pub entries: Vec<NewEntry>,
}

/// [`Entry`] of a new distribution plan.
#[derive(Clone, Copy, Debug)]
pub struct NewEntry {
    /// ID of the [`Unit`] to allocate the [`Area`] to.
    pub unit_id: unit::Id,

    /// Allocated [`Area`].
    pub area: Area,

    /// [`Coefficient`] of the allocated [`Area`], `1` if not provided.
    pub coefficient: Option<Coefficient>,
}

impl<Db> Command<SaveDistribution> for Service<Db>
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
            Select<By<HashMap<unit::Id, Unit>, Vec<unit::Id>>>,
            Ok = HashMap<unit::Id, Unit>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Vec<Entry>, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Vec<Entry>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<Entry>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SaveDistribution,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SaveDistribution {
            contract_id,
            entries,
        } = cmd;

        if entries.is_empty() {
            return Err(tracerr::new!(E::EmptyPlan));
        }
        let mut seen = HashSet::with_capacity(entries.len());
        if let Some(dup) = entries.iter().find(|e| !seen.insert(e.unit_id)) {
            return Err(tracerr::new!(E::DuplicateUnit(dup.unit_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize plan replacements of the same `Contract`.
        tx.execute(Lock(By::<Contract, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| !c.is_deleted())
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let units = tx
            .execute(Select(By::<HashMap<unit::Id, Unit>, _>::new(
                entries.iter().map(|e| e.unit_id).collect::<Vec<_>>(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let (plan, unknown): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .map(|e| {
                units
                    .get(&e.unit_id)
                    .filter(|u| u.development_id == contract.development_id)
                    .map(|u| Entry {
                        contract_id,
                        unit_id: u.id,
                        block_name: u.block_name.clone(),
                        floor: u.floor,
                        area: e.area,
                        coefficient: e.coefficient.unwrap_or_default(),
                    })
                    .ok_or(e.unit_id)
            })
            .partition(Result::is_ok);
        let unknown = unknown
            .into_iter()
            .filter_map(Result::err)
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            return Err(tracerr::new!(E::UnknownUnits(unknown)));
        }
        let plan = plan.into_iter().filter_map(Result::ok).collect::<Vec<_>>();

        check_plan(
            &plan,
            &contract.area_by_floor,
            self.config().distribution_tolerance,
        )
        .map_err(E::PlanViolated)
        .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::<Vec<Entry>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(plan.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "replaced distribution plan of `Contract(number: {})` with {} \
             entries",
            contract.number,
            plan.len(),
        );

        Ok(plan)
    }
}

/// Error of [`SaveDistribution`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Same [`Unit`] is allocated more than once.
    #[display("`Unit(id: {_0})` is allocated more than once")]
    DuplicateUnit(#[error(not(source))] unit::Id),

    /// Plan has no [`Entry`]s.
    #[display("Distribution plan cannot be empty")]
    EmptyPlan,

    /// Plan doesn't match the contracted floor [`Area`]s.
    #[display(
        "Distribution plan doesn't match the contracted floors: {}",
        display_violations(_0)
    )]
    PlanViolated(#[error(not(source))] Vec<Violation>),

    /// [`Unit`]s don't exist in the [`Contract`]'s `Development`.
    #[display(
        "{} `Unit`s don't belong to the `Contract` development",
        _0.len()
    )]
    UnknownUnits(#[error(not(source))] Vec<unit::Id>),
}

/// Joins the provided [`Violation`]s into a single line.
fn display_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ContractNotExists(_) => ErrorKind::NotFound,
            Self::Db(_) => ErrorKind::Internal,
            Self::DuplicateUnit(_)
            | Self::EmptyPlan
            | Self::PlanViolated(_)
            | Self::UnknownUnits(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Area;
    use futures::executor::block_on;
    use rust_decimal::Decimal;

    use crate::{
        domain::{block, contract, distribution::Violation, unit},
        infra::database::memory::MemoryDb,
        Command as _,
    };

    use super::{ExecutionError, NewEntry, SaveDistribution};

    fn area(s: &str) -> Area {
        Area::from_str(s).unwrap()
    }

    fn entries(units: &[unit::Id], a: &str) -> Vec<NewEntry> {
        units
            .iter()
            .map(|id| NewEntry {
                unit_id: *id,
                area: area(a),
                coefficient: None,
            })
            .collect()
    }

    /// Prepares a [`MemoryDb`] with a `Contract` over floor 1 of 300m2 and
    /// 3 apartments on that floor.
    fn setup() -> (MemoryDb, contract::Id, Vec<unit::Id>) {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(
            development,
            block::Layout::new(1, 3, false, 0).unwrap(),
        );
        let units = db.generate_units(block);
        let contract = db.add_contract(development, &[(1, "300")]);
        (db, contract, units)
    }

    #[test]
    fn saves_plan() {
        let (db, contract, units) = setup();
        let svc = db.service();

        let plan = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&units, "100"),
        }))
        .unwrap();

        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|e| e.floor == 1));
        assert_eq!(db.plan_of(contract).len(), 3);
        assert!(db.plan_of(contract).iter().all(|e| {
            e.area == area("100") && e.coefficient.decimal() == Decimal::ONE
        }));
    }

    #[test]
    fn replaces_whole_plan() {
        let (db, contract, units) = setup();
        let svc = db.service();

        _ = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&units, "100"),
        }))
        .unwrap();
        _ = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&units[..2], "150"),
        }))
        .unwrap();

        let plan = db.plan_of(contract);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|e| e.area == area("150")));
    }

    #[test]
    fn keeps_previous_plan_on_failure() {
        let (db, contract, units) = setup();
        let svc = db.service();
        _ = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&units, "100"),
        }))
        .unwrap();

        db.fail_plan_inserts();
        let err = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&units[..1], "300"),
        }))
        .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Db(_)));
        let plan = db.plan_of(contract);
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|e| e.area == area("100")));
    }

    #[test]
    fn rejects_plan_not_matching_floors() {
        let (db, contract, units) = setup();
        let svc = db.service();

        let err = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&units, "90"),
        }))
        .unwrap_err();

        match err.as_ref() {
            ExecutionError::PlanViolated(violations) => assert_eq!(
                violations,
                &[Violation::FloorSumMismatch {
                    floor: 1,
                    expected: area("300"),
                    actual: area("270"),
                }],
            ),
            e => panic!("unexpected error: {e}"),
        }
        assert!(db.plan_of(contract).is_empty());
    }

    #[test]
    fn rejects_plan_of_single_floor() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(
            development,
            block::Layout::new(2, 2, false, 0).unwrap(),
        );
        let units = db.generate_units(block);
        let contract = db.add_contract(development, &[(1, "100"), (2, "100")]);
        let svc = db.service();

        _ = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&units, "50"),
        }))
        .unwrap();

        let err = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&units[2..], "50"),
        }))
        .unwrap_err();

        match err.as_ref() {
            ExecutionError::PlanViolated(violations) => assert_eq!(
                violations,
                &[Violation::FloorSumMismatch {
                    floor: 1,
                    expected: area("100"),
                    actual: Area::ZERO,
                }],
            ),
            e => panic!("unexpected error: {e}"),
        }
        let mut floors =
            db.plan_of(contract).iter().map(|e| e.floor).collect::<Vec<_>>();
        floors.sort_unstable();
        assert_eq!(floors, [1, 1, 2, 2]);
    }

    #[test]
    fn rejects_empty_and_foreign_entries() {
        let (db, contract, units) = setup();
        let other_development = db.add_development();
        let other_block = db.add_block(
            other_development,
            block::Layout::new(1, 1, false, 0).unwrap(),
        );
        let foreign = db.generate_units(other_block);
        let svc = db.service();

        let err = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: vec![],
        }))
        .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::EmptyPlan));

        let mut mixed = entries(&units, "100");
        mixed.extend(entries(&foreign, "1"));
        let err = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: mixed,
        }))
        .unwrap_err();
        match err.as_ref() {
            ExecutionError::UnknownUnits(ids) => assert_eq!(ids, &foreign),
            e => panic!("unexpected error: {e}"),
        }

        let err = block_on(svc.execute(SaveDistribution {
            contract_id: contract,
            entries: entries(&[units[0], units[0]], "150"),
        }))
        .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DuplicateUnit(_)));
    }
}
