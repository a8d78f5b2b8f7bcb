use std::fmt;

use serde::{Deserialize, Serialize};

/// Monetary value attached to a reward, credited by the wallet collaborator.
///
/// The ledger never does arithmetic on this value; it is carried through the
/// redemption flow and handed to the external wallet as-is. Point balances
/// themselves are always integers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardValue {
    /// Amount in the wallet's native unit.
    pub amount: f64,
    /// ISO 4217 currency code (e.g. "USD", "AED").
    pub currency: String,
}

impl RewardValue {
    /// Create a new value.
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for RewardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}
