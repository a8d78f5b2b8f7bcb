use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Marketplace role a user earns and spends points under.
///
/// Points are segregated per `(user, role)` account: the same person acting
/// as a customer and as a driver holds two independent balances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Consumer across all verticals (rides, food, bookings, parking, stays).
    Customer,
    /// Ride or delivery driver.
    Driver,
    /// Venue staff (restaurants, hotels).
    Staff,
    /// Merchant or venue owner.
    Merchant,
}

impl Role {
    /// All supported roles, in stable order.
    pub const fn all() -> [Role; 4] {
        [Role::Customer, Role::Driver, Role::Staff, Role::Merchant]
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Driver => "driver",
            Role::Staff => "staff",
            Role::Merchant => "merchant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "driver" => Ok(Role::Driver),
            "staff" => Ok(Role::Staff),
            "merchant" => Ok(Role::Merchant),
            other => Err(TypeError::UnknownRole(other.to_string())),
        }
    }
}
