use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tally_types::{GrantId, RedemptionId, RewardId, RewardValue, Role, UserId};

/// Lifecycle state of a point grant.
///
/// Depletion is an explicit state transition: a grant whose points reach
/// zero moves to `Consumed` and can never be counted or selected again.
/// This replaces the implicit "set the expiry date to now" convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GrantStatus {
    /// The grant can still be spent, until `expires_at` (if set) passes.
    Active {
        expires_at: Option<DateTime<Utc>>,
    },
    /// The grant was fully depleted by a redemption at the given instant.
    Consumed { at: DateTime<Utc> },
}

impl GrantStatus {
    /// Returns `true` if the grant has been fully depleted.
    pub fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed { .. })
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active { expires_at: None } => write!(f, "active"),
            Self::Active {
                expires_at: Some(at),
            } => write!(f, "active until {at}"),
            Self::Consumed { at } => write!(f, "consumed at {at}"),
        }
    }
}

/// One unit of earned points.
///
/// `awarded_points` is the immutable amount granted by the award;
/// `points` is the remaining amount, which only ever decreases toward
/// zero as redemptions deplete the grant oldest-first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointGrant {
    pub id: GrantId,
    pub user: UserId,
    pub role: Role,
    /// Identifier of the earning event, from the role's configured set.
    pub action: String,
    /// Points originally granted. Never changes.
    pub awarded_points: u32,
    /// Points remaining. Mutated only by redemption depletion.
    pub points: u32,
    /// Award instant; the FIFO consumption order key.
    pub created_at: DateTime<Utc>,
    pub status: GrantStatus,
    /// Opaque context attached at award time (order id, trip id, ...).
    pub metadata: BTreeMap<String, Value>,
}

impl PointGrant {
    /// Returns `true` if this grant contributes to balances at `as_of`
    /// and may be selected for depletion.
    pub fn usable_at(&self, as_of: DateTime<Utc>) -> bool {
        match self.status {
            GrantStatus::Consumed { .. } => false,
            GrantStatus::Active { expires_at } => {
                self.points > 0 && expires_at.map_or(true, |at| as_of < at)
            }
        }
    }

    /// The instant after which the grant is unusable, if any.
    ///
    /// For consumed grants this is the consumption instant, matching the
    /// soft-expiry view the history endpoint exposes.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            GrantStatus::Active { expires_at } => expires_at,
            GrantStatus::Consumed { at } => Some(at),
        }
    }
}

/// Inputs to a ledger award.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AwardRequest {
    pub user: UserId,
    pub role: Role,
    pub action: String,
    pub points: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: BTreeMap<String, Value>,
}

impl AwardRequest {
    /// Create a request with no expiry and empty metadata.
    pub fn new(user: UserId, role: Role, action: impl Into<String>, points: u32) -> Self {
        Self {
            user,
            role,
            action: action.into(),
            points,
            expires_at: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style: set the expiry instant.
    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Builder-style: attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Final state of a redemption's post-commit wallet credit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// Points were depleted and the wallet credit succeeded (or is pending
    /// its first attempt).
    Completed,
    /// Points were depleted but the wallet credit failed; the redemption
    /// is queued for reconciliation. The point deduction stands.
    Failed { reason: String },
}

impl RedemptionStatus {
    /// Returns `true` for `Completed`.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A committed redemption: points were atomically depleted for a reward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub id: RedemptionId,
    pub user: UserId,
    pub role: Role,
    pub reward: RewardId,
    /// Points depleted across grants. Always equals the reward's cost.
    pub points_spent: u32,
    /// Value the wallet collaborator credits, keyed by `id` for idempotency.
    pub value: RewardValue,
    pub redeemed_at: DateTime<Utc>,
    pub status: RedemptionStatus,
}
