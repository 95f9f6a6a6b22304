//! Decimal type utilities for fixed-point money amounts

pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Money amount (balances, deposits, fund minimums)
pub type Amount = Decimal;

/// Precision helpers for amounts
pub mod precision {
    use super::*;

    /// Amounts carry at most two decimal places
    pub const AMOUNT_PRECISION: u32 = 2;

    /// Largest amount accepted at the boundary (15 digits, 2 of them decimals)
    pub const MAX_AMOUNT: Amount = dec!(9999999999999.99);

    /// Whether an amount is representable without rounding
    pub fn fits_precision(amount: Amount) -> bool {
        amount.round_dp(AMOUNT_PRECISION) == amount && amount.abs() <= MAX_AMOUNT
    }
}
