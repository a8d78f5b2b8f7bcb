use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use tally_types::{RedemptionId, RewardValue, UserId};

/// Failure of a wallet credit attempt. Always safe to retry: credits are
/// idempotent by redemption id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("wallet credit failed: {reason}")]
pub struct CreditError {
    pub reason: String,
}

impl CreditError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Boundary to the host's wallet system.
///
/// Implementations must treat the redemption id as an idempotency key: a
/// replayed credit for an id that already landed is a no-op success.
pub trait WalletGateway: Send + Sync {
    fn credit(
        &self,
        redemption: &RedemptionId,
        user: &UserId,
        value: &RewardValue,
    ) -> Result<(), CreditError>;
}

/// In-memory wallet for tests and demos.
///
/// Records one credit per redemption id. `set_failing(true)` makes new
/// credits fail, which exercises the reconciliation path; replays of
/// already-landed credits still succeed.
#[derive(Default)]
pub struct InMemoryWallet {
    credits: RwLock<HashMap<RedemptionId, RewardValue>>,
    failing: AtomicBool,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent first-time credits fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns `true` if a credit for the redemption has landed.
    pub fn credited(&self, redemption: &RedemptionId) -> bool {
        self.credits.read().contains_key(redemption)
    }

    /// Number of distinct credits that have landed.
    pub fn credit_count(&self) -> usize {
        self.credits.read().len()
    }
}

impl WalletGateway for InMemoryWallet {
    fn credit(
        &self,
        redemption: &RedemptionId,
        user: &UserId,
        value: &RewardValue,
    ) -> Result<(), CreditError> {
        if self.credits.read().contains_key(redemption) {
            debug!(redemption = %redemption, "credit replay, already landed");
            return Ok(());
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CreditError::new("wallet unavailable"));
        }
        self.credits.write().insert(*redemption, value.clone());
        debug!(redemption = %redemption, user = %user, value = %value, "wallet credited");
        Ok(())
    }
}

/// Redemptions whose wallet credit failed and awaits a retry.
///
/// The point deduction behind each queued redemption already stands;
/// draining the queue only re-attempts the credit.
#[derive(Default)]
pub struct ReconciliationQueue {
    pending: Mutex<VecDeque<RedemptionId>>,
}

impl ReconciliationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, redemption: RedemptionId) {
        self.pending.lock().push_back(redemption);
    }

    /// Take every queued redemption, oldest first.
    pub fn drain(&self) -> Vec<RedemptionId> {
        self.pending.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
