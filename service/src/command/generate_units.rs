//! [`Command`] for generating [`Unit`]s out of [`Block`] layouts.

use common::operations::{By, Commit, Insert, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use futures::future;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{block, development, Block, Development, Unit},
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for generating [`Unit`]s of a [`Development`] out of its
/// [`Block`] layouts.
///
/// Re-generation is idempotent: already existing [`Unit`]s are skipped.
/// Every [`Block`] is generated in its own transaction, concurrently with the
/// others, so a failure of one [`Block`] doesn't affect the rest.
#[derive(Clone, Copy, Debug)]
pub struct GenerateUnits {
    /// ID of the [`Development`] to generate [`Unit`]s for.
    pub development_id: development::Id,

    /// ID of the only [`Block`] to generate [`Unit`]s for, if any.
    pub block_id: Option<block::Id>,
}

/// Counters of a [`GenerateUnits`] execution.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Generated {
    /// Number of [`Unit`]s implied by the [`Block`] layouts.
    pub considered: usize,

    /// Number of newly created [`Unit`]s.
    pub inserted: usize,

    /// Number of [`Unit`]s skipped as already existing.
    pub skipped: usize,
}

impl std::ops::Add for Generated {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            considered: self.considered + rhs.considered,
            inserted: self.inserted + rhs.inserted,
            skipped: self.skipped + rhs.skipped,
        }
    }
}

/// Result of generating [`Unit`]s of a single [`Block`].
#[derive(Debug)]
pub struct BlockOutcome {
    /// ID of the [`Block`].
    pub block_id: block::Id,

    /// Name of the [`Block`].
    pub block_name: block::Name,

    /// [`Generated`] counters, or the error the [`Block`] failed with.
    pub result: Result<Generated, Traced<database::Error>>,
}

/// Result of a [`GenerateUnits`] execution.
#[derive(Debug)]
pub struct Outcome {
    /// [`BlockOutcome`]s in the order of [`Block`] names.
    pub blocks: Vec<BlockOutcome>,
}

impl Outcome {
    /// Sums up [`Generated`] counters of all the succeeded [`Block`]s.
    #[must_use]
    pub fn total(&self) -> Generated {
        self.blocks
            .iter()
            .filter_map(|b| b.result.as_ref().ok())
            .fold(Generated::default(), |acc, g| acc + *g)
    }

    /// Iterates over the failed [`BlockOutcome`]s.
    pub fn failed(&self) -> impl Iterator<Item = &BlockOutcome> {
        self.blocks.iter().filter(|b| b.result.is_err())
    }
}

impl<Db> Command<GenerateUnits> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Development>, development::Id>>,
            Ok = Option<Development>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Block>, development::Id>>,
            Ok = Vec<Block>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Insert<Vec<Unit>>,
            Ok = u64,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Outcome;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: GenerateUnits) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GenerateUnits {
            development_id,
            block_id,
        } = cmd;

        self.database()
            .execute(Select(By::<Option<Development>, _>::new(development_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DevelopmentNotExists(development_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let mut blocks = self
            .database()
            .execute(Select(By::<Vec<Block>, _>::new(development_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(id) = block_id {
            blocks.retain(|b| b.id == id);
            if blocks.is_empty() {
                return Err(tracerr::new!(E::BlockNotExists(id)));
            }
        }
        if blocks.is_empty() {
            return Err(tracerr::new!(E::NoBlocks(development_id)));
        }

        let blocks = future::join_all(blocks.into_iter().map(|block| {
            async move {
                let result = generate(self.database(), &block).await;
                match &result {
                    Ok(g) => log::info!(
                        "generated {} new `Unit`s in `Block(name: {})` \
                         of `Development(id: {development_id})`, \
                         {} already existed",
                        g.inserted,
                        block.name,
                        g.skipped,
                    ),
                    Err(e) => log::error!(
                        "failed to generate `Unit`s in `Block(name: {})` \
                         of `Development(id: {development_id})`: {e}",
                        block.name,
                    ),
                }
                BlockOutcome {
                    block_id: block.id,
                    block_name: block.name,
                    result,
                }
            }
        }))
        .await;

        Ok(Outcome { blocks })
    }
}

/// Generates the [`Unit`]s of the provided [`Block`] in a separate
/// transaction.
async fn generate<Db>(
    db: &Db,
    block: &Block,
) -> Result<Generated, Traced<database::Error>>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Insert<Vec<Unit>>,
            Ok = u64,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    let units = block
        .layout
        .slots()
        .map(|slot| Unit::in_slot(block, slot))
        .collect::<Vec<_>>();
    let considered = units.len();

    let tx = db.execute(Transact).await.map_err(tracerr::wrap!())?;
    let inserted = tx.execute(Insert(units)).await.map_err(tracerr::wrap!())?;
    tx.execute(Commit)
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

    let inserted =
        usize::try_from(inserted).map_or(considered, |n| n.min(considered));
    Ok(Generated {
        considered,
        inserted,
        skipped: considered - inserted,
    })
}

/// Error of [`GenerateUnits`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Block`] with the provided ID does not exist in the [`Development`].
    #[display("`Block(id: {_0})` does not exist")]
    BlockNotExists(#[error(not(source))] block::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Development`] with the provided ID does not exist.
    #[display("`Development(id: {_0})` does not exist")]
    DevelopmentNotExists(#[error(not(source))] development::Id),

    /// [`Development`] has no [`Block`]s to generate [`Unit`]s from.
    #[display("`Development(id: {_0})` has no `Block`s")]
    NoBlocks(#[error(not(source))] development::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BlockNotExists(_)
            | Self::DevelopmentNotExists(_)
            | Self::NoBlocks(_) => ErrorKind::NotFound,
            Self::Db(_) => ErrorKind::Internal,
        }
    }
}
