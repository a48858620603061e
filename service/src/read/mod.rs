//! Read entities definitions.

pub mod contract;
pub mod development;
pub mod distribution;
pub mod unit;
