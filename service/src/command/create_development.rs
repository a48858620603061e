//! [`Command`] for creating a new [`Development`].

use std::collections::HashSet;

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{block, development, Block, Development, Notes},
    infra::{database, Database},
    ErrorKind, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Development`] along with its [`Block`]s.
#[derive(Clone, Debug)]
pub struct CreateDevelopment {
    /// Name of a new [`Development`].
    pub name: development::Name,

    /// [`Notes`] about a new [`Development`].
    pub notes: Option<Notes>,

    /// Whether a new [`Development`] is active.
    pub is_active: bool,

    /// [`NewBlock`]s of a new [`Development`].
    pub blocks: Vec<NewBlock>,
}

/// [`Block`] to be created in a [`Development`].
#[derive(Clone, Debug)]
pub struct NewBlock {
    /// Name of the [`Block`].
    pub name: block::Name,

    /// [`block::Layout`] of the [`Block`].
    pub layout: block::Layout,
}

impl NewBlock {
    /// Describes `count` [`NewBlock`]s of the same [`block::Layout`], named
    /// `Block 01`, `Block 02` and so on.
    #[must_use]
    pub fn numbered(count: usize, layout: block::Layout) -> Vec<Self> {
        (1..=count)
            .map(|n| Self {
                name: block::Name::numbered(n),
                layout,
            })
            .collect()
    }
}

/// Checks the provided [`NewBlock`]s have distinct names.
///
/// # Errors
///
/// With the first repeated [`block::Name`].
pub(crate) fn ensure_distinct_names(
    blocks: &[NewBlock],
) -> Result<(), block::Name> {
    let mut seen = HashSet::with_capacity(blocks.len());
    blocks
        .iter()
        .find(|b| !seen.insert(&b.name))
        .map_or(Ok(()), |b| Err(b.name.clone()))
}

impl<Db> Command<CreateDevelopment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Development>, Err = Traced<database::Error>>
        + Database<Insert<Block>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Development;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateDevelopment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateDevelopment {
            name,
            notes,
            is_active,
            blocks,
        } = cmd;

        ensure_distinct_names(&blocks)
            .map_err(E::DuplicateBlockName)
            .map_err(tracerr::wrap!())?;

        let development = Development {
            id: development::Id::new(),
            name,
            notes,
            is_active,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Insert(development.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        for NewBlock { name, layout } in blocks {
            tx.execute(Insert(Block {
                id: block::Id::new(),
                development_id: development.id,
                name,
                layout,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(development)
    }
}

/// Error of [`CreateDevelopment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Several [`Block`]s share the same name.
    #[display("`Block(name: {_0})` is specified more than once")]
    DuplicateBlockName(#[error(not(source))] block::Name),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::DuplicateBlockName(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::block;

    use super::{ensure_distinct_names, NewBlock};

    #[test]
    fn numbers_blocks() {
        let layout = block::Layout::new(4, 2, false, 0).unwrap();
        let blocks = NewBlock::numbered(3, layout);

        assert_eq!(
            blocks.iter().map(|b| b.name.to_string()).collect::<Vec<_>>(),
            ["Block 01", "Block 02", "Block 03"],
        );
        assert!(ensure_distinct_names(&blocks).is_ok());
    }

    #[test]
    fn detects_duplicate_block_names() {
        let layout = block::Layout::new(4, 2, false, 0).unwrap();
        let mut blocks = NewBlock::numbered(2, layout);
        blocks.push(NewBlock {
            name: block::Name::numbered(1),
            layout,
        });

        assert_eq!(
            ensure_distinct_names(&blocks),
            Err(block::Name::numbered(1)),
        );
    }
}
