//! [`Command`] definition.

pub mod approve_execution;
pub mod create_contract;
pub mod create_development;
pub mod create_unit;
pub mod delete_contract;
pub mod delete_development;
pub mod delete_unit;
pub mod generate_units;
pub mod record_execution;
pub mod save_distribution;
pub mod update_contract;
pub mod update_development;
pub mod update_unit;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    approve_execution::ApproveExecution, create_contract::CreateContract,
    create_development::CreateDevelopment, create_unit::CreateUnit,
    delete_contract::DeleteContract, delete_development::DeleteDevelopment,
    delete_unit::DeleteUnit, generate_units::GenerateUnits,
    record_execution::RecordExecution, save_distribution::SaveDistribution,
    update_contract::UpdateContract, update_development::UpdateDevelopment,
    update_unit::UpdateUnit,
};
