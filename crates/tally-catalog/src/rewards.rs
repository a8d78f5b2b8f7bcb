use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use tally_types::{RewardId, RewardValue};

/// Kind of benefit a reward delivers.
///
/// Roles are restricted to a configured set of kinds; e.g. a driver may
/// redeem cashback but not customer ride vouchers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    /// Direct wallet credit.
    Cashback,
    /// Percentage or fixed discount on a future order.
    Discount,
    /// Voucher redeemable against a vertical (ride, meal, stay).
    Voucher,
    /// Host-defined kind outside the built-in set.
    Custom(String),
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cashback => write!(f, "cashback"),
            Self::Discount => write!(f, "discount"),
            Self::Voucher => write!(f, "voucher"),
            Self::Custom(name) => write!(f, "custom({name})"),
        }
    }
}

/// One entry in the reward catalog, read-only to the ledger core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub id: RewardId,
    /// Point cost to redeem this reward. Must be positive; a zero-cost
    /// reward is rejected by the redemption engine as invalid input.
    pub points_required: u32,
    pub kind: RewardKind,
    /// Value the wallet collaborator credits on successful redemption.
    pub value: RewardValue,
    pub is_active: bool,
}

/// Read boundary for the external reward catalog collaborator.
pub trait RewardCatalog: Send + Sync {
    /// Look up a reward by id. `None` if the catalog has no such reward.
    fn get(&self, id: &RewardId) -> Option<RewardEntry>;
}

/// In-memory reward catalog for tests, demos, and embedding.
#[derive(Default)]
pub struct InMemoryRewardCatalog {
    entries: RwLock<HashMap<RewardId, RewardEntry>>,
}

impl InMemoryRewardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog entry.
    pub fn insert(&self, entry: RewardEntry) {
        self.entries.write().insert(entry.id.clone(), entry);
    }

    /// Number of entries in the catalog.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl RewardCatalog for InMemoryRewardCatalog {
    fn get(&self, id: &RewardId) -> Option<RewardEntry> {
        self.entries.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, points: u32) -> RewardEntry {
        RewardEntry {
            id: RewardId::new(id),
            points_required: points,
            kind: RewardKind::Cashback,
            value: RewardValue::new(5.0, "USD"),
            is_active: true,
        }
    }

    #[test]
    fn insert_and_get() {
        let catalog = InMemoryRewardCatalog::new();
        catalog.insert(entry("free-coffee", 25));

        let found = catalog.get(&RewardId::new("free-coffee")).unwrap();
        assert_eq!(found.points_required, 25);
        assert!(catalog.get(&RewardId::new("missing")).is_none());
    }

    #[test]
    fn insert_replaces_existing() {
        let catalog = InMemoryRewardCatalog::new();
        catalog.insert(entry("r1", 10));
        catalog.insert(entry("r1", 20));

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&RewardId::new("r1")).unwrap().points_required, 20);
    }

    #[test]
    fn kind_display() {
        assert_eq!(format!("{}", RewardKind::Cashback), "cashback");
        assert_eq!(
            format!("{}", RewardKind::Custom("free_parking".into())),
            "custom(free_parking)"
        );
    }

    #[test]
    fn serde_roundtrip() {
        let e = entry("r2", 50);
        let json = serde_json::to_string(&e).unwrap();
        let parsed: RewardEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(e, parsed);
    }
}
