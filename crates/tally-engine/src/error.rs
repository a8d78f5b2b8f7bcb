use tally_catalog::RewardKind;
use tally_ledger::LedgerError;
use tally_types::{RewardId, Role};

/// Errors produced by the redemption engine and facade operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("reward not found: {0}")]
    RewardNotFound(RewardId),

    #[error("reward {0} is not currently redeemable")]
    RewardInactive(RewardId),

    #[error("role {role} may not redeem {kind} rewards")]
    RewardNotAllowed { role: Role, kind: RewardKind },

    #[error("reward {reward} is misconfigured: {reason}")]
    InvalidReward { reward: RewardId, reason: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EngineError {
    /// Returns `true` if the caller should retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(err) if err.is_retryable())
    }
}
