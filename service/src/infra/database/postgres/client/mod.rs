//! Postgres database clients.
//!
//! Both are cheap to clone and acquire their pooled connections lazily.

pub mod non_tx;
pub mod tx;

pub use self::{non_tx::NonTx, tx::Tx};
