//! In-memory [`Database`] for tests.
//!
//! Mirrors [`Postgres`] split into non-transactional and transactional
//! clients: [`MemoryDb<Shared>`] sees committed data only, while
//! [`MemoryDb<Staged>`] applies writes to its own snapshot and replays them
//! onto the shared data on [`Commit`].
//!
//! [`Postgres`]: super::Postgres

use std::{
    collections::{HashMap, HashSet},
    str::FromStr as _,
    sync::{Arc, Mutex},
};

use common::{
    money::Currency,
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Update,
    },
    Area, DateTime, Money,
};
use tracerr::Traced;

use crate::{
    domain::{
        block, contract, development, distribution::Entry, execution, unit,
        Block, Contract, Development, Execution, Unit,
    },
    command::create_unit::ADDRESS_CONSTRAINT,
    infra::{database, Database},
    read::{
        self,
        contract::ExecutedArea,
        unit::{DistributedIn, HasExecutions, OnFloor},
    },
    Config, Service,
};

/// Data kept by a [`MemoryDb`].
#[derive(Clone, Debug, Default)]
pub(crate) struct State {
    developments: Vec<Development>,
    blocks: Vec<Block>,
    units: Vec<Unit>,
    contracts: Vec<Contract>,
    entries: Vec<Entry>,
    executions: Vec<Execution>,

    /// [`Block`]s whose [`Unit`]s fail to be inserted.
    failing_blocks: HashSet<block::Id>,

    /// Indicator whether inserting distribution [`Entry`]s fails.
    failing_plan_inserts: bool,

    /// Indicator whether reading [`ExecutedArea`]s fails.
    failing_executed_reads: bool,
}

impl State {
    /// Removes the [`Unit`]s matching the `predicate` along with their
    /// distribution [`Entry`]s and [`Execution`]s.
    fn remove_units(&mut self, predicate: impl Fn(&Unit) -> bool) {
        let removed = self
            .units
            .iter()
            .filter(|u| predicate(u))
            .map(|u| u.id)
            .collect::<HashSet<_>>();
        self.units.retain(|u| !removed.contains(&u.id));
        self.entries.retain(|e| !removed.contains(&e.unit_id));
        self.executions.retain(|e| !removed.contains(&e.unit_id));
    }
}

/// Access to a [`State`].
pub(crate) trait Store {
    /// Reads the [`State`].
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R;

    /// Modifies the [`State`].
    fn write<R: 'static>(&self, f: impl Fn(&mut State) -> R + 'static) -> R;
}

/// Committed [`State`] shared between all the [`MemoryDb`] clients.
#[derive(Clone, Debug, Default)]
pub(crate) struct Shared(Arc<Mutex<State>>);

impl Store for Shared {
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&*self.0.lock().unwrap())
    }

    fn write<R: 'static>(
        &self,
        f: impl Fn(&mut State) -> R + 'static,
    ) -> R {
        f(&mut *self.0.lock().unwrap())
    }
}

/// Write replayed onto the [`Shared`] [`State`] on [`Commit`].
type Change = Box<dyn Fn(&mut State)>;

/// Snapshot of the [`Shared`] [`State`] modified by a transaction.
#[derive(derive_more::Debug)]
pub(crate) struct Staged {
    shared: Shared,
    state: Mutex<State>,
    #[debug(skip)]
    changes: Mutex<Vec<Change>>,
}

impl Store for Staged {
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&*self.state.lock().unwrap())
    }

    fn write<R: 'static>(
        &self,
        f: impl Fn(&mut State) -> R + 'static,
    ) -> R {
        let out = f(&mut *self.state.lock().unwrap());
        self.changes.lock().unwrap().push(Box::new(move |s: &mut State| {
            _ = f(s);
        }));
        out
    }
}

/// In-memory [`Database`] client.
#[derive(Clone, Debug)]
pub(crate) struct MemoryDb<S = Shared>(S);

impl Default for MemoryDb {
    fn default() -> Self {
        Self(Shared::default())
    }
}

impl MemoryDb {
    /// Creates a new [`Service`] backed by this [`MemoryDb`].
    pub(crate) fn service(&self) -> Service<Self> {
        Service::new(Config::default(), self.clone())
    }

    /// Adds a new active [`Development`].
    pub(crate) fn add_development(&self) -> development::Id {
        let id = development::Id::new();
        let development = Development {
            id,
            name: development::Name::new("Residencial Aurora").unwrap(),
            notes: None,
            is_active: true,
            created_at: DateTime::now().coerce(),
        };
        self.0.write(move |s| s.developments.push(development.clone()));
        id
    }

    /// Adds a new [`Block`] with the provided [`block::Layout`] to the
    /// [`Development`], naming it after the number of its [`Block`]s.
    pub(crate) fn add_block(
        &self,
        development_id: development::Id,
        layout: block::Layout,
    ) -> block::Id {
        let id = block::Id::new();
        let n = self.0.read(|s| {
            s.blocks
                .iter()
                .filter(|b| b.development_id == development_id)
                .count()
        });
        let block = Block {
            id,
            development_id,
            name: block::Name::numbered(n + 1),
            layout,
        };
        self.0.write(move |s| s.blocks.push(block.clone()));
        id
    }

    /// Makes inserting [`Unit`]s of the [`Block`] fail.
    pub(crate) fn fail_units_of(&self, block_id: block::Id) {
        self.0.write(move |s| _ = s.failing_blocks.insert(block_id));
    }

    /// Makes inserting distribution [`Entry`]s fail.
    pub(crate) fn fail_plan_inserts(&self) {
        self.0.write(|s| s.failing_plan_inserts = true);
    }

    /// Makes reading [`ExecutedArea`]s fail.
    pub(crate) fn fail_executed_reads(&self) {
        self.0.write(|s| s.failing_executed_reads = true);
    }

    /// Creates all the [`Unit`]s of the [`Block`] directly, returning their
    /// IDs.
    pub(crate) fn generate_units(&self, block_id: block::Id) -> Vec<unit::Id> {
        let units = self.0.read(|s| {
            let block = s.blocks.iter().find(|b| b.id == block_id).unwrap();
            block
                .layout
                .slots()
                .map(|slot| Unit::in_slot(block, slot))
                .collect::<Vec<_>>()
        });
        let ids = units.iter().map(|u| u.id).collect();
        self.0.write(move |s| s.units.extend(units.iter().cloned()));
        ids
    }

    /// Adds a new active [`Contract`] over the provided floor areas.
    pub(crate) fn add_contract(
        &self,
        development_id: development::Id,
        floors: &[(unit::Floor, &str)],
    ) -> contract::Id {
        let id = contract::Id::new();
        let area_by_floor = contract::AreaByFloor::new(
            floors
                .iter()
                .map(|(floor, area)| (*floor, Area::from_str(area).unwrap())),
        )
        .unwrap();
        let n = self.0.read(|s| s.contracts.len());
        let contract = Contract {
            id,
            number: contract::Number::new(format!("CT-{:03}", n + 1))
                .unwrap(),
            development_id,
            service_type: contract::ServiceType::Flooring,
            total_value: Money {
                amount: 45_000.into(),
                currency: Currency::Brl,
            },
            value_per_area: None,
            total_area: area_by_floor.total(),
            area_by_floor,
            status: contract::Status::Active,
            notes: None,
            starts_on: None,
            expected_end_on: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
            deleted_at: None,
        };
        self.0.write(move |s| s.contracts.push(contract.clone()));
        id
    }

    /// Returns all the committed [`Unit`]s.
    pub(crate) fn units(&self) -> Vec<Unit> {
        self.0.read(|s| s.units.clone())
    }

    /// Returns all the committed [`Block`]s.
    pub(crate) fn blocks(&self) -> Vec<Block> {
        self.0.read(|s| s.blocks.clone())
    }

    /// Returns all the committed [`Contract`]s, including deleted ones.
    pub(crate) fn contracts(&self) -> Vec<Contract> {
        self.0.read(|s| s.contracts.clone())
    }

    /// Returns the committed distribution plan of the [`Contract`].
    pub(crate) fn plan_of(&self, contract_id: contract::Id) -> Vec<Entry> {
        self.0.read(|s| {
            s.entries
                .iter()
                .filter(|e| e.contract_id == contract_id)
                .cloned()
                .collect()
        })
    }

    /// Returns the committed [`Execution`]s of the [`Contract`].
    pub(crate) fn executions_of(
        &self,
        contract_id: contract::Id,
    ) -> Vec<Execution> {
        self.0.read(|s| {
            s.executions
                .iter()
                .filter(|e| e.contract_id == contract_id)
                .cloned()
                .collect()
        })
    }
}

impl Database<Transact> for MemoryDb {
    type Ok = MemoryDb<Staged>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(MemoryDb(Staged {
            shared: self.0.clone(),
            state: Mutex::new(self.0.read(Clone::clone)),
            changes: Mutex::default(),
        }))
    }
}

impl Database<Commit> for MemoryDb<Staged> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let changes = std::mem::take(&mut *self.0.changes.lock().unwrap());
        let mut shared = self.0.shared.0.lock().unwrap();
        for change in changes {
            change(&mut *shared);
        }
        Ok(())
    }
}

impl<S: Store> Database<Select<By<Option<Development>, development::Id>>>
    for MemoryDb<S>
{
    type Ok = Option<Development>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Development>, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .0
            .read(|s| s.developments.iter().find(|d| d.id == id).cloned()))
    }
}

impl<S: Store> Database<Select<By<Vec<Block>, development::Id>>>
    for MemoryDb<S>
{
    type Ok = Vec<Block>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Block>, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| {
            s.blocks
                .iter()
                .filter(|b| b.development_id == id)
                .cloned()
                .collect()
        }))
    }
}

impl<S: Store> Database<Insert<Vec<Unit>>> for MemoryDb<S> {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(units): Insert<Vec<Unit>>,
    ) -> Result<Self::Ok, Self::Err> {
        let failing = self.0.read(|s| {
            units.iter().any(|u| s.failing_blocks.contains(&u.block_id))
        });
        if failing {
            return Err(tracerr::new!(database::Error::Injected(
                "cannot insert `Unit`s",
            )));
        }

        Ok(self.0.write(move |s| {
            let mut inserted = 0;
            for unit in &units {
                let exists = s.units.iter().any(|u| {
                    u.development_id == unit.development_id
                        && u.address() == unit.address()
                });
                if !exists {
                    s.units.push(unit.clone());
                    inserted += 1;
                }
            }
            inserted
        }))
    }
}

impl<S: Store> Database<Select<By<Option<Unit>, unit::Id>>> for MemoryDb<S> {
    type Ok = Option<Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Unit>, unit::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.units.iter().find(|u| u.id == id).cloned()))
    }
}

impl<S: Store> Database<Select<By<HashMap<unit::Id, Unit>, Vec<unit::Id>>>>
    for MemoryDb<S>
{
    type Ok = HashMap<unit::Id, Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<unit::Id, Unit>, Vec<unit::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        Ok(self.0.read(|s| {
            s.units
                .iter()
                .filter(|u| ids.contains(&u.id))
                .map(|u| (u.id, u.clone()))
                .collect()
        }))
    }
}

impl<S: Store> Database<Lock<By<Contract, contract::Id>>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<S: Store> Database<Select<By<Option<Contract>, contract::Id>>>
    for MemoryDb<S>
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .0
            .read(|s| s.contracts.iter().find(|c| c.id == id).cloned()))
    }
}

impl<S: Store> Database<Update<Contract>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| {
            if let Some(c) = s.contracts.iter_mut().find(|c| c.id == contract.id)
            {
                *c = contract.clone();
            }
        });
        Ok(())
    }
}

impl<S: Store> Database<Delete<By<Vec<Entry>, contract::Id>>>
    for MemoryDb<S>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<Entry>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0.write(move |s| s.entries.retain(|e| e.contract_id != id));
        Ok(())
    }
}

impl<S: Store> Database<Insert<Vec<Entry>>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entries): Insert<Vec<Entry>>,
    ) -> Result<Self::Ok, Self::Err> {
        if self.0.read(|s| s.failing_plan_inserts) {
            return Err(tracerr::new!(database::Error::Injected(
                "cannot insert distribution entries",
            )));
        }
        self.0.write(move |s| s.entries.extend(entries.iter().cloned()));
        Ok(())
    }
}

impl<S: Store>
    Database<Select<By<Option<Entry>, (contract::Id, unit::Id)>>>
    for MemoryDb<S>
{
    type Ok = Option<Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Entry>, (contract::Id, unit::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (contract_id, unit_id) = by.into_inner();
        Ok(self.0.read(|s| {
            s.entries
                .iter()
                .find(|e| e.contract_id == contract_id && e.unit_id == unit_id)
                .cloned()
        }))
    }
}

impl<S: Store> Database<Insert<Execution>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(execution): Insert<Execution>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| s.executions.push(execution.clone()));
        Ok(())
    }
}

impl<S: Store> Database<Update<Execution>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(execution): Update<Execution>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| {
            if let Some(e) =
                s.executions.iter_mut().find(|e| e.id == execution.id)
            {
                *e = execution.clone();
            }
        });
        Ok(())
    }
}

impl<S: Store> Database<Lock<By<Execution, execution::Id>>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Execution, execution::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<S: Store> Database<Select<By<Option<Execution>, execution::Id>>>
    for MemoryDb<S>
{
    type Ok = Option<Execution>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Execution>, execution::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .0
            .read(|s| s.executions.iter().find(|e| e.id == id).cloned()))
    }
}

impl<S: Store, IDs>
    Database<Select<By<HashMap<contract::Id, ExecutedArea>, IDs>>>
    for MemoryDb<S>
where
    IDs: AsRef<[contract::Id]>,
{
    type Ok = HashMap<contract::Id, ExecutedArea>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<contract::Id, ExecutedArea>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        if self.0.read(|s| s.failing_executed_reads) {
            return Err(tracerr::new!(database::Error::Injected(
                "cannot read executed areas",
            )));
        }

        let ids = by.into_inner();
        let ids = ids.as_ref();
        Ok(self.0.read(|s| {
            let mut executed = HashMap::<_, ExecutedArea>::new();
            for e in s.executions.iter().filter(|e| ids.contains(&e.contract_id))
            {
                executed.entry(e.contract_id).or_default().0 += e.area;
            }
            executed
        }))
    }
}

impl<S: Store> Database<Lock<By<Development, development::Id>>>
    for MemoryDb<S>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Development, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<S: Store, IDs>
    Database<Select<By<HashMap<development::Id, Development>, IDs>>>
    for MemoryDb<S>
where
    IDs: AsRef<[development::Id]>,
{
    type Ok = HashMap<development::Id, Development>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<development::Id, Development>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids = ids.as_ref();
        Ok(self.0.read(|s| {
            s.developments
                .iter()
                .filter(|d| ids.contains(&d.id))
                .map(|d| (d.id, d.clone()))
                .collect()
        }))
    }
}

impl<S: Store> Database<Update<Development>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(development): Update<Development>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| {
            if let Some(d) =
                s.developments.iter_mut().find(|d| d.id == development.id)
            {
                *d = development.clone();
            }
        });
        Ok(())
    }
}

impl<S: Store> Database<Delete<By<Development, development::Id>>>
    for MemoryDb<S>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Development, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0.write(move |s| {
            let contracts = s
                .contracts
                .iter()
                .filter(|c| c.development_id == id)
                .map(|c| c.id)
                .collect::<HashSet<_>>();
            s.entries.retain(|e| !contracts.contains(&e.contract_id));
            s.executions.retain(|e| !contracts.contains(&e.contract_id));
            s.contracts.retain(|c| c.development_id != id);
            s.remove_units(|u| u.development_id == id);
            s.blocks.retain(|b| b.development_id != id);
            s.developments.retain(|d| d.id != id);
        });
        Ok(())
    }
}

impl<S: Store> Database<Select<By<Option<Block>, block::Id>>> for MemoryDb<S> {
    type Ok = Option<Block>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Block>, block::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.blocks.iter().find(|b| b.id == id).cloned()))
    }
}

impl<S: Store> Database<Insert<Block>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(block): Insert<Block>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| s.blocks.push(block.clone()));
        Ok(())
    }
}

impl<S: Store> Database<Update<Block>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(block): Update<Block>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| {
            if let Some(b) = s.blocks.iter_mut().find(|b| b.id == block.id) {
                *b = block.clone();
            }
        });
        Ok(())
    }
}

impl<S: Store> Database<Delete<By<Block, block::Id>>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Block, block::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0.write(move |s| {
            s.remove_units(|u| u.block_id == id);
            s.blocks.retain(|b| b.id != id);
        });
        Ok(())
    }
}

impl<S: Store> Database<Insert<Unit>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(unit): Insert<Unit>,
    ) -> Result<Self::Ok, Self::Err> {
        let exists = self.0.read(|s| {
            s.units.iter().any(|u| {
                u.development_id == unit.development_id
                    && u.address() == unit.address()
            })
        });
        if exists {
            return Err(tracerr::new!(database::Error::UniqueViolation(
                ADDRESS_CONSTRAINT,
            )));
        }
        self.0.write(move |s| s.units.push(unit.clone()));
        Ok(())
    }
}

impl<S: Store> Database<Update<Unit>> for MemoryDb<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(unit): Update<Unit>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| {
            if let Some(u) = s.units.iter_mut().find(|u| u.id == unit.id) {
                *u = unit.clone();
            }
        });
        Ok(())
    }
}

impl<S: Store> Database<Select<By<Vec<Unit>, block::Id>>> for MemoryDb<S> {
    type Ok = Vec<Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Unit>, block::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut units = self.0.read(|s| {
            s.units
                .iter()
                .filter(|u| u.block_id == id)
                .cloned()
                .collect::<Vec<_>>()
        });
        units.sort_by_key(|u| (u.floor, u.label.to_string()));
        Ok(units)
    }
}

impl<S: Store> Database<Select<By<Vec<Unit>, OnFloor>>> for MemoryDb<S> {
    type Ok = Vec<Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Unit>, OnFloor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OnFloor {
            development_id,
            floor,
            kind,
        } = by.into_inner();
        let mut units = self.0.read(|s| {
            s.units
                .iter()
                .filter(|u| {
                    u.development_id == development_id
                        && u.floor == floor
                        && u.kind == kind
                })
                .cloned()
                .collect::<Vec<_>>()
        });
        units.sort_by_key(|u| (u.block_name.to_string(), u.label.to_string()));
        Ok(units)
    }
}

impl<S: Store, IDs> Database<Lock<By<Vec<Unit>, IDs>>> for MemoryDb<S>
where
    IDs: AsRef<[unit::Id]>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Vec<Unit>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<S: Store, IDs> Database<Select<By<HasExecutions, IDs>>> for MemoryDb<S>
where
    IDs: AsRef<[unit::Id]>,
{
    type Ok = HasExecutions;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HasExecutions, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids = ids.as_ref();
        Ok(HasExecutions(self.0.read(|s| {
            s.executions.iter().any(|e| ids.contains(&e.unit_id))
        })))
    }
}

impl<S: Store, IDs> Database<Select<By<DistributedIn, IDs>>> for MemoryDb<S>
where
    IDs: AsRef<[unit::Id]>,
{
    type Ok = DistributedIn;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<DistributedIn, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids = ids.as_ref();
        let mut numbers = self.0.read(|s| {
            s.contracts
                .iter()
                .filter(|c| {
                    !c.is_deleted()
                        && s.entries.iter().any(|e| {
                            e.contract_id == c.id && ids.contains(&e.unit_id)
                        })
                })
                .map(|c| c.number.clone())
                .collect::<Vec<_>>()
        });
        numbers.sort_by(|a, b| {
            AsRef::<str>::as_ref(a).cmp(AsRef::<str>::as_ref(b))
        });
        Ok(DistributedIn(numbers))
    }
}

impl<S: Store, IDs> Database<Delete<By<Vec<Unit>, IDs>>> for MemoryDb<S>
where
    IDs: AsRef<[unit::Id]>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<Unit>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner().as_ref().to_vec();
        self.0.write(move |s| s.remove_units(|u| ids.contains(&u.id)));
        Ok(())
    }
}

impl<S: Store> Database<Select<By<Option<Contract>, contract::Number>>>
    for MemoryDb<S>
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        Ok(self.0.read(|s| {
            s.contracts.iter().find(|c| c.number == number).cloned()
        }))
    }
}

impl<S: Store> Database<Select<By<Vec<Contract>, read::contract::Filter>>>
    for MemoryDb<S>
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, read::contract::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::Filter { active_only } = by.into_inner();
        let mut contracts = self.0.read(|s| {
            s.contracts
                .iter()
                .filter(|c| {
                    !c.is_deleted()
                        && (!active_only
                            || c.status == contract::Status::Active)
                })
                .cloned()
                .collect::<Vec<_>>()
        });
        contracts.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))
        });
        Ok(contracts)
    }
}
