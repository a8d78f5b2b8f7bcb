use chrono::{DateTime, Utc};

use tally_types::{RedemptionId, RewardId, RewardValue, Role, UserId};

use crate::error::LedgerError;
use crate::records::{AwardRequest, PointGrant, RedemptionRecord, RedemptionStatus};

/// Write boundary for ledger mutations.
pub trait LedgerWriter: Send + Sync {
    /// Append a new grant after validating the request against the active
    /// configuration (role, action, daily cap).
    fn award(&self, request: AwardRequest) -> Result<PointGrant, LedgerError>;

    /// Atomically deplete `required` points from the account's usable
    /// grants, oldest-first, and record the redemption.
    ///
    /// Serialized per `(user, role)`; a shortfall aborts with zero
    /// mutation. The returned record has status `Completed`.
    fn settle(
        &self,
        user: &UserId,
        role: Role,
        required: u32,
        reward: &RewardId,
        value: &RewardValue,
    ) -> Result<RedemptionRecord, LedgerError>;

    /// Update the post-commit status of a recorded redemption.
    ///
    /// Used by the reconciliation flow; grant mutations are never touched.
    fn update_redemption_status(
        &self,
        id: &RedemptionId,
        status: RedemptionStatus,
    ) -> Result<RedemptionRecord, LedgerError>;
}

/// Read boundary for ledger queries and derived views.
///
/// Reads reflect committed state only and never wait on the redemption
/// lock.
pub trait LedgerReader: Send + Sync {
    /// Usable point total for the account at `as_of`.
    fn balance(&self, user: &UserId, role: Role, as_of: DateTime<Utc>)
        -> Result<u64, LedgerError>;

    /// All grants for the account, oldest first.
    fn grants(&self, user: &UserId, role: Role) -> Result<Vec<PointGrant>, LedgerError>;

    /// Up to `limit` grants for the account, newest first, with current
    /// remaining points.
    fn history(
        &self,
        user: &UserId,
        role: Role,
        limit: usize,
    ) -> Result<Vec<PointGrant>, LedgerError>;

    /// All grants awarded under the role, across users.
    fn grants_for_role(&self, role: Role) -> Result<Vec<PointGrant>, LedgerError>;

    /// Look up a redemption by id.
    fn redemption(&self, id: &RedemptionId) -> Result<Option<RedemptionRecord>, LedgerError>;

    /// All redemptions for the account, newest first.
    fn redemptions_for(
        &self,
        user: &UserId,
        role: Role,
    ) -> Result<Vec<RedemptionRecord>, LedgerError>;
}
