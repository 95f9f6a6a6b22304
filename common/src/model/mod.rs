//! Domain models for the fund ledger

pub mod fund;
pub mod client;
pub mod balance;
pub mod transaction;
pub mod subscription;

pub use fund::{Fund, FundInfo, FundType, RiskLevel};
pub use client::Client;
pub use balance::ClientBalance;
pub use transaction::{Transaction, TransactionType, DEPOSIT_FUND_ID, INITIAL_BALANCE_FUND_ID};
pub use subscription::{ClientFundSubscription, ExistingSubscription};
