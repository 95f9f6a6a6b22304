//! Fund ledger workspace
//!
//! Re-exports the member crates so cross-crate scenarios can be tested
//! from the workspace root.

pub use api_gateway;
pub use common;
pub use ledger_service;
