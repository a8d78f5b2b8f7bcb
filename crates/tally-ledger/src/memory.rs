use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use tally_catalog::{ActionCatalog, CatalogError};
use tally_types::{RedemptionId, RewardId, RewardValue, Role, UserId};

use crate::depletion::plan_oldest_first;
use crate::error::LedgerError;
use crate::records::{
    AwardRequest, GrantStatus, PointGrant, RedemptionRecord, RedemptionStatus,
};
use crate::traits::{LedgerReader, LedgerWriter};

/// Default bound on how long a redemption waits for its account lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type AccountKey = (UserId, Role);

#[derive(Default)]
struct LedgerState {
    /// Grants per account, in append (= `created_at` ascending) order.
    accounts: HashMap<AccountKey, Vec<PointGrant>>,
    redemptions: HashMap<RedemptionId, RedemptionRecord>,
}

/// In-memory points ledger for tests, local demos, and embedding.
///
/// Awards and reads share a single `RwLock` over the state. Redemptions
/// additionally hold a per-account mutex from `CheckBalance` through
/// `Commit`, so concurrent redemptions for the same `(user, role)` are
/// serialized while awards and reads proceed freely.
pub struct InMemoryLedger {
    rules: ActionCatalog,
    lock_timeout: Duration,
    inner: RwLock<LedgerState>,
    account_locks: Mutex<HashMap<AccountKey, Arc<Mutex<()>>>>,
}

impl InMemoryLedger {
    /// Create a ledger with the given earning rules and the default
    /// redemption lock timeout.
    pub fn new(rules: ActionCatalog) -> Self {
        Self::with_lock_timeout(rules, DEFAULT_LOCK_TIMEOUT)
    }

    /// Create a ledger with an explicit redemption lock timeout.
    pub fn with_lock_timeout(rules: ActionCatalog, lock_timeout: Duration) -> Self {
        Self {
            rules,
            lock_timeout,
            inner: RwLock::new(LedgerState::default()),
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The earning rules this ledger validates awards against.
    pub fn rules(&self) -> &ActionCatalog {
        &self.rules
    }

    fn account_lock(&self, key: &AccountKey) -> Arc<Mutex<()>> {
        let mut locks = self.account_locks.lock();
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Points awarded to the account during the UTC day containing `now`.
    fn awarded_on_day(state: &LedgerState, key: &AccountKey, day: DateTime<Utc>) -> u32 {
        state
            .accounts
            .get(key)
            .map(|grants| {
                grants
                    .iter()
                    .filter(|g| g.created_at.date_naive() == day.date_naive())
                    .map(|g| g.awarded_points)
                    .sum()
            })
            .unwrap_or(0)
    }
}

impl LedgerWriter for InMemoryLedger {
    fn award(&self, request: AwardRequest) -> Result<PointGrant, LedgerError> {
        if request.points == 0 {
            return Err(LedgerError::InvalidPoints);
        }

        let known = self
            .rules
            .knows_action(request.role, &request.action)
            .map_err(|err| match err {
                CatalogError::RoleNotConfigured(role) => LedgerError::UnsupportedRole(role),
                _ => LedgerError::InvalidAction {
                    role: request.role,
                    action: request.action.clone(),
                },
            })?;
        if !known {
            return Err(LedgerError::InvalidAction {
                role: request.role,
                action: request.action.clone(),
            });
        }

        let cap = self
            .rules
            .daily_cap(request.role)
            .map_err(|_| LedgerError::UnsupportedRole(request.role))?;

        let key = (request.user.clone(), request.role);
        let now = Utc::now();

        // Cap check and insert under one write lock: count-then-insert is
        // atomic with respect to concurrent awards for the same account.
        let mut state = self.inner.write();

        if let Some(cap) = cap {
            let awarded_today = Self::awarded_on_day(&state, &key, now);
            if awarded_today + request.points > cap {
                return Err(LedgerError::DailyCapExceeded {
                    role: request.role,
                    cap,
                    awarded_today,
                    requested: request.points,
                });
            }
        }

        let grant = PointGrant {
            id: tally_types::GrantId::new(),
            user: request.user,
            role: request.role,
            action: request.action,
            awarded_points: request.points,
            points: request.points,
            created_at: now,
            status: GrantStatus::Active {
                expires_at: request.expires_at,
            },
            metadata: request.metadata,
        };

        state.accounts.entry(key).or_default().push(grant.clone());

        debug!(
            grant = %grant.id,
            user = %grant.user,
            role = %grant.role,
            action = %grant.action,
            points = grant.points,
            "grant awarded"
        );
        Ok(grant)
    }

    fn settle(
        &self,
        user: &UserId,
        role: Role,
        required: u32,
        reward: &RewardId,
        value: &RewardValue,
    ) -> Result<RedemptionRecord, LedgerError> {
        if required == 0 {
            return Err(LedgerError::InvalidPoints);
        }

        let key = (user.clone(), role);

        // LockScope: exclusive per-account scope, bounded wait. A timeout
        // is a retryable conflict, not a failure of the redemption itself.
        let lock = self.account_lock(&key);
        let _scope = lock
            .try_lock_for(self.lock_timeout)
            .ok_or_else(|| LedgerError::ConcurrencyConflict {
                user: user.clone(),
                role,
            })?;

        let now = Utc::now();

        // CheckBalance + Deplete planning over a committed snapshot. No
        // concurrent settle can touch this account while `_scope` is held;
        // concurrent awards only append, which a plan keyed by grant id
        // cannot conflict with.
        let snapshot: Vec<PointGrant> = {
            let state = self.inner.read();
            state
                .accounts
                .get(&key)
                .map(|grants| {
                    grants
                        .iter()
                        .filter(|g| g.usable_at(now))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        let plan = plan_oldest_first(&snapshot, required)?;

        // Commit: apply every debit and record the redemption as one
        // critical section.
        let record = RedemptionRecord {
            id: RedemptionId::new(),
            user: user.clone(),
            role,
            reward: reward.clone(),
            points_spent: required,
            value: value.clone(),
            redeemed_at: now,
            status: RedemptionStatus::Completed,
        };

        {
            let mut state = self.inner.write();
            let grants = state.accounts.entry(key).or_default();
            for debit in &plan.debits {
                if let Some(grant) = grants.iter_mut().find(|g| g.id == debit.grant) {
                    grant.points -= debit.amount;
                    if debit.consumes {
                        grant.status = GrantStatus::Consumed { at: now };
                    }
                }
            }
            state.redemptions.insert(record.id, record.clone());
        }

        info!(
            redemption = %record.id,
            user = %record.user,
            role = %record.role,
            reward = %record.reward,
            points = record.points_spent,
            grants_touched = plan.debits.len(),
            "redemption settled"
        );
        Ok(record)
    }

    fn update_redemption_status(
        &self,
        id: &RedemptionId,
        status: RedemptionStatus,
    ) -> Result<RedemptionRecord, LedgerError> {
        let mut state = self.inner.write();
        let record = state
            .redemptions
            .get_mut(id)
            .ok_or(LedgerError::RedemptionNotFound(*id))?;
        record.status = status;
        Ok(record.clone())
    }
}

impl LedgerReader for InMemoryLedger {
    fn balance(
        &self,
        user: &UserId,
        role: Role,
        as_of: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        let state = self.inner.read();
        Ok(state
            .accounts
            .get(&(user.clone(), role))
            .map(|grants| {
                grants
                    .iter()
                    .filter(|g| g.usable_at(as_of))
                    .map(|g| u64::from(g.points))
                    .sum()
            })
            .unwrap_or(0))
    }

    fn grants(&self, user: &UserId, role: Role) -> Result<Vec<PointGrant>, LedgerError> {
        let state = self.inner.read();
        Ok(state
            .accounts
            .get(&(user.clone(), role))
            .cloned()
            .unwrap_or_default())
    }

    fn history(
        &self,
        user: &UserId,
        role: Role,
        limit: usize,
    ) -> Result<Vec<PointGrant>, LedgerError> {
        let mut grants = self.grants(user, role)?;
        grants.reverse();
        grants.truncate(limit);
        Ok(grants)
    }

    fn grants_for_role(&self, role: Role) -> Result<Vec<PointGrant>, LedgerError> {
        let state = self.inner.read();
        Ok(state
            .accounts
            .iter()
            .filter(|((_, r), _)| *r == role)
            .flat_map(|(_, grants)| grants.iter().cloned())
            .collect())
    }

    fn redemption(&self, id: &RedemptionId) -> Result<Option<RedemptionRecord>, LedgerError> {
        let state = self.inner.read();
        Ok(state.redemptions.get(id).cloned())
    }

    fn redemptions_for(
        &self,
        user: &UserId,
        role: Role,
    ) -> Result<Vec<RedemptionRecord>, LedgerError> {
        let state = self.inner.read();
        let mut records: Vec<_> = state
            .redemptions
            .values()
            .filter(|r| r.user == *user && r.role == role)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}
