//! [`Command`] for updating an existing [`Development`].

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{block, development, unit, Block, Development, Notes, Unit},
    infra::{database, Database},
    read::unit::{DistributedIn, HasExecutions},
    ErrorKind, Service,
};

use super::{
    create_development::{ensure_distinct_names, NewBlock},
    Command,
};

/// [`Command`] for updating an existing [`Development`].
///
/// Only the provided fields are changed.
#[derive(Clone, Debug)]
pub struct UpdateDevelopment {
    /// ID of the [`Development`] to be updated.
    pub id: development::Id,

    /// New name of the [`Development`].
    pub name: Option<development::Name>,

    /// New [`Notes`] about the [`Development`].
    pub notes: Option<Option<Notes>>,

    /// New activity of the [`Development`].
    pub is_active: Option<bool>,

    /// New set of the [`Development`] [`Block`]s.
    ///
    /// [`Block`]s are matched by name: matching ones get the new
    /// [`block::Layout`] keeping their [`Unit`]s, missing ones are created,
    /// and the ones not listed are removed along with their [`Unit`]s.
    ///
    /// [`Unit`]s left out of a shrunk [`block::Layout`] are removed too.
    /// Nothing is removed if any of the removed [`Unit`]s has executions.
    pub blocks: Option<Vec<NewBlock>>,
}

impl<Db> Command<UpdateDevelopment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Development, development::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Development>, development::Id>>,
            Ok = Option<Development>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Block>, development::Id>>,
            Ok = Vec<Block>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Unit>, block::Id>>,
            Ok = Vec<Unit>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Vec<Unit>, Vec<unit::Id>>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HasExecutions, Vec<unit::Id>>>,
            Ok = HasExecutions,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<DistributedIn, Vec<unit::Id>>>,
            Ok = DistributedIn,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Vec<Unit>, Vec<unit::Id>>>,
            Err = Traced<database::Error>,
        > + Database<Update<Development>, Err = Traced<database::Error>>
        + Database<Insert<Block>, Err = Traced<database::Error>>
        + Database<Update<Block>, Err = Traced<database::Error>>
        + Database<Delete<By<Block, block::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Development;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateDevelopment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateDevelopment {
            id,
            name,
            notes,
            is_active,
            blocks,
        } = cmd;

        if let Some(blocks) = &blocks {
            ensure_distinct_names(blocks)
                .map_err(E::DuplicateBlockName)
                .map_err(tracerr::wrap!())?;
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::<Development, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut development = tx
            .execute(Select(By::<Option<Development>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DevelopmentNotExists(id))
            .map_err(tracerr::wrap!())?;

        if let Some(name) = name {
            development.name = name;
        }
        if let Some(notes) = notes {
            development.notes = notes;
        }
        if let Some(is_active) = is_active {
            development.is_active = is_active;
        }
        tx.execute(Update(development.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(blocks) = blocks {
            let mut existing = tx
                .execute(Select(By::<Vec<Block>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            for NewBlock { name, layout } in blocks {
                let Some(pos) = existing.iter().position(|b| b.name == name)
                else {
                    tx.execute(Insert(Block {
                        id: block::Id::new(),
                        development_id: id,
                        name,
                        layout,
                    }))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                    continue;
                };

                let mut block = existing.swap_remove(pos);
                if block.layout == layout {
                    continue;
                }

                let left_out = layout.leaves_out(block.layout);
                let ids = tx
                    .execute(Select(By::<Vec<Unit>, _>::new(block.id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .into_iter()
                    .filter(|u| left_out(u))
                    .map(|u| u.id)
                    .collect::<Vec<_>>();
                if !ids.is_empty() {
                    ensure_removable(&tx, &block.name, &ids).await?;
                    log::info!(
                        "removing {} `Unit`s left out of the new layout of \
                         `Block(name: {})` of `Development(id: {id})`",
                        ids.len(),
                        block.name,
                    );
                    tx.execute(Delete(By::<Vec<Unit>, _>::new(ids)))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }

                block.layout = layout;
                tx.execute(Update(block))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }

            for removed in existing {
                let ids = tx
                    .execute(Select(By::<Vec<Unit>, _>::new(removed.id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .into_iter()
                    .map(|u| u.id)
                    .collect::<Vec<_>>();
                ensure_removable(&tx, &removed.name, &ids).await?;

                log::info!(
                    "removing `Block(name: {})` of `Development(id: {id})`",
                    removed.name,
                );
                tx.execute(Delete(By::<Block, _>::new(removed.id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(development)
    }
}

/// Locks the [`Unit`]s of the [`Block`] about to be removed and checks none
/// of them has executions.
///
/// Logs a warning if any of the [`Unit`]s is distributed in a `Contract`.
///
/// # Errors
///
/// If any of the [`Unit`]s has executions recorded.
async fn ensure_removable<Tx>(
    tx: &Tx,
    block_name: &block::Name,
    ids: &[unit::Id],
) -> Result<(), Traced<ExecutionError>>
where
    Tx: Database<
            Lock<By<Vec<Unit>, Vec<unit::Id>>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HasExecutions, Vec<unit::Id>>>,
            Ok = HasExecutions,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<DistributedIn, Vec<unit::Id>>>,
            Ok = DistributedIn,
            Err = Traced<database::Error>,
        >,
{
    use ExecutionError as E;

    if ids.is_empty() {
        return Ok(());
    }

    tx.execute(Lock(By::<Vec<Unit>, _>::new(ids.to_vec())))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

    let has_executions = tx
        .execute(Select(By::<HasExecutions, _>::new(ids.to_vec())))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;
    if *has_executions {
        return Err(tracerr::new!(E::UnitsHaveExecutions(block_name.clone())));
    }

    let DistributedIn(contracts) = tx
        .execute(Select(By::<DistributedIn, _>::new(ids.to_vec())))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;
    if !contracts.is_empty() {
        log::warn!(
            "removed `Unit`s of `Block(name: {block_name})` are distributed \
             in `Contract`s {}, so their plans no longer cover the contracted \
             floor areas",
            contracts
                .iter()
                .map(AsRef::<str>::as_ref)
                .collect::<Vec<_>>()
                .join(", "),
        );
    }

    Ok(())
}

/// Error of [`UpdateDevelopment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Development`] with the provided ID does not exist.
    #[display("`Development(id: {_0})` does not exist")]
    DevelopmentNotExists(#[error(not(source))] development::Id),

    /// Several [`Block`]s share the same name.
    #[display("`Block(name: {_0})` is specified more than once")]
    DuplicateBlockName(#[error(not(source))] block::Name),

    /// [`Unit`]s to be removed along with the [`Block`] or its floors have
    /// executions recorded.
    #[display(
        "`Block(name: {_0})` cannot lose `Unit`s with recorded executions"
    )]
    UnitsHaveExecutions(#[error(not(source))] block::Name),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::DevelopmentNotExists(_) => ErrorKind::NotFound,
            Self::DuplicateBlockName(_) => ErrorKind::Validation,
            Self::UnitsHaveExecutions(_) => ErrorKind::Conflict,
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
            create_development::NewBlock, save_distribution::NewEntry,
            RecordExecution, SaveDistribution,
        },
        domain::{block, contract, development, execution::Responsible, unit},
        infra::database::memory::MemoryDb,
        Command as _,
    };

    use super::{ExecutionError, UpdateDevelopment};

    fn layout(floors: u16, per_floor: u16) -> block::Layout {
        block::Layout::new(floors, per_floor, false, 0).unwrap()
    }

    fn reshape(
        id: development::Id,
        blocks: impl IntoIterator<Item = (usize, block::Layout)>,
    ) -> UpdateDevelopment {
        UpdateDevelopment {
            id,
            name: None,
            notes: None,
            is_active: None,
            blocks: Some(
                blocks
                    .into_iter()
                    .map(|(n, layout)| NewBlock {
                        name: block::Name::numbered(n),
                        layout,
                    })
                    .collect(),
            ),
        }
    }

    fn distribute(
        db: &MemoryDb,
        contract_id: contract::Id,
        units: &[unit::Id],
        area: &str,
    ) {
        _ = block_on(db.service().execute(SaveDistribution {
            contract_id,
            entries: units
                .iter()
                .map(|id| NewEntry {
                    unit_id: *id,
                    area: Area::from_str(area).unwrap(),
                    coefficient: None,
                })
                .collect(),
        }))
        .unwrap();
    }

    #[test]
    fn matches_creates_and_removes_blocks() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let kept = db.add_block(development, layout(2, 2));
        let removed = db.add_block(development, layout(1, 1));
        _ = db.generate_units(kept);
        _ = db.generate_units(removed);

        let updated = block_on(db.service().execute(reshape(
            development,
            [(1, layout(2, 2)), (3, layout(1, 2))],
        )))
        .unwrap();

        assert_eq!(updated.id, development);
        let mut blocks = db
            .blocks()
            .into_iter()
            .map(|b| (b.name.to_string(), b.layout))
            .collect::<Vec<_>>();
        blocks.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            blocks,
            [
                ("Block 01".to_owned(), layout(2, 2)),
                ("Block 03".to_owned(), layout(1, 2)),
            ],
        );
        assert!(db.blocks().iter().any(|b| b.id == kept));
        let units = db.units();
        assert_eq!(units.len(), 4);
        assert!(units.iter().all(|u| u.block_id == kept));
    }

    #[test]
    fn removes_units_left_out_of_shrunk_layout() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(development, layout(3, 2));
        let units = db.generate_units(block);
        let contract = db.add_contract(development, &[(1, "100")]);
        distribute(&db, contract, &units[..2], "50");

        _ = block_on(
            db.service().execute(reshape(development, [(1, layout(2, 1))])),
        )
        .unwrap();

        let mut labels = db
            .units()
            .iter()
            .map(|u| u.label.to_string())
            .collect::<Vec<_>>();
        labels.sort();
        assert_eq!(labels, ["101", "201"]);
        assert_eq!(db.blocks()[0].layout, layout(2, 1));
        let plan = db.plan_of(contract);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].unit_id, units[0]);
    }

    #[test]
    fn refuses_removing_units_with_executions() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(development, layout(2, 1));
        let units = db.generate_units(block);
        let contract = db.add_contract(development, &[(2, "40")]);
        distribute(&db, contract, &units[1..], "40");
        _ = block_on(db.service().execute(RecordExecution {
            contract_id: contract,
            unit_id: units[1],
            area: Decimal::from(15),
            measured_on: Some(Date::from_calendar(2024, 9, 2).unwrap()),
            responsible: Responsible::new("Equipe Rocha").unwrap(),
            notes: None,
        }))
        .unwrap();
        let svc = db.service();

        let err = block_on(
            svc.execute(reshape(development, [(1, layout(1, 1))])),
        )
        .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::UnitsHaveExecutions(name)
                if name.to_string() == "Block 01",
        ));

        let err = block_on(
            svc.execute(reshape(development, [(2, layout(1, 1))])),
        )
        .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::UnitsHaveExecutions(_),
        ));

        let blocks = db.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].layout, layout(2, 1));
        assert_eq!(db.units().len(), 2);
        assert_eq!(db.plan_of(contract).len(), 1);
        assert_eq!(db.executions_of(contract).len(), 1);
    }

    #[test]
    fn fails_on_unknown_development() {
        let db = MemoryDb::default();

        let err = block_on(
            db.service()
                .execute(reshape(development::Id::new(), [(1, layout(1, 1))])),
        )
        .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::DevelopmentNotExists(_),
        ));
    }
}
