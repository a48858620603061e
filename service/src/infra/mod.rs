//! Infrastructure layer, storing the domain behind [`Database`] operations.

pub mod database;

pub use self::database::Database;
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
