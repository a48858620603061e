//! Domain definitions.

pub mod block;
pub mod contract;
pub mod development;
pub mod distribution;
pub mod execution;
pub mod unit;

use common::define_text;

pub use self::{
    block::Block, contract::Contract, development::Development,
    execution::Execution, unit::Unit,
};

define_text! {
    #[doc = "Free-form notes attached to a domain entity."]
    struct Notes(max_len = 4096);
}
