use tally_types::{RedemptionId, Role, UserId};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("points must be a positive integer")]
    InvalidPoints,

    #[error("role {0} is not supported by the active configuration")]
    UnsupportedRole(Role),

    #[error("action '{action}' does not earn points for role {role}")]
    InvalidAction { role: Role, action: String },

    #[error(
        "daily cap of {cap} points for role {role} would be exceeded: \
         {awarded_today} already awarded, {requested} requested"
    )]
    DailyCapExceeded {
        role: Role,
        cap: u32,
        awarded_today: u32,
        requested: u32,
    },

    #[error("insufficient points: {required} required, {available} available")]
    InsufficientPoints { required: u32, available: u64 },

    #[error("timed out waiting for the redemption lock on {user}/{role}")]
    ConcurrencyConflict { user: UserId, role: Role },

    #[error("redemption not found: {0}")]
    RedemptionNotFound(RedemptionId),
}

impl LedgerError {
    /// Returns `true` if the caller should retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_concurrency_conflict_is_retryable() {
        let conflict = LedgerError::ConcurrencyConflict {
            user: UserId::new("u1"),
            role: Role::Customer,
        };
        assert!(conflict.is_retryable());

        let shortfall = LedgerError::InsufficientPoints {
            required: 10,
            available: 5,
        };
        assert!(!shortfall.is_retryable());
    }
}
