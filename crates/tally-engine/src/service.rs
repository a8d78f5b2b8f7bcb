use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use tally_catalog::{ActionCatalog, CatalogError, RewardCatalog};
use tally_ledger::{
    AccountSummary, AuditReport, AwardRequest, InMemoryLedger, LeaderboardProjection,
    LedgerAuditor, LedgerError, LedgerReader, LedgerWriter, PointGrant, ProjectionBuilder,
    RedemptionRecord, RedemptionStatus,
};
use tally_types::{RedemptionId, RewardId, Role, UserId};

use crate::config::EngineConfig;
use crate::effects::{ReconciliationQueue, WalletGateway};
use crate::error::EngineError;
use crate::events::{EventHub, LedgerEvent};

/// Embedding facade over the ledger, reward catalog, and wallet.
///
/// One instance per deployment. All operations take `&self` and are safe
/// to call from any thread; serialization of conflicting redemptions
/// happens inside the ledger.
pub struct TallyEngine<L = InMemoryLedger> {
    ledger: Arc<L>,
    rules: ActionCatalog,
    catalog: Arc<dyn RewardCatalog>,
    wallet: Arc<dyn WalletGateway>,
    events: EventHub,
    reconciliation: ReconciliationQueue,
    config: EngineConfig,
}

impl TallyEngine<InMemoryLedger> {
    /// Build an engine over a fresh in-memory ledger.
    pub fn new(
        rules: ActionCatalog,
        catalog: Arc<dyn RewardCatalog>,
        wallet: Arc<dyn WalletGateway>,
    ) -> Self {
        Self::with_config(rules, catalog, wallet, EngineConfig::default())
    }

    /// Build an engine over a fresh in-memory ledger with explicit
    /// tunables.
    pub fn with_config(
        rules: ActionCatalog,
        catalog: Arc<dyn RewardCatalog>,
        wallet: Arc<dyn WalletGateway>,
        config: EngineConfig,
    ) -> Self {
        let ledger = Arc::new(InMemoryLedger::new(rules.clone()));
        Self::from_parts(ledger, rules, catalog, wallet, config)
    }
}

impl<L> TallyEngine<L>
where
    L: LedgerReader + LedgerWriter,
{
    /// Assemble an engine from pre-built collaborators. The ledger must
    /// already validate awards against the same `rules`.
    pub fn from_parts(
        ledger: Arc<L>,
        rules: ActionCatalog,
        catalog: Arc<dyn RewardCatalog>,
        wallet: Arc<dyn WalletGateway>,
        config: EngineConfig,
    ) -> Self {
        let events = EventHub::new(config.event_capacity);
        Self {
            ledger,
            rules,
            catalog,
            wallet,
            events,
            reconciliation: ReconciliationQueue::new(),
            config,
        }
    }

    /// The event fan-out for this engine.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Redemptions whose wallet credit still awaits reconciliation.
    pub fn pending_reconciliations(&self) -> usize {
        self.reconciliation.len()
    }

    // --- awards ---

    /// Award the configured points for one occurrence of `action`.
    pub fn record_action(
        &self,
        user: &UserId,
        role: Role,
        action: &str,
    ) -> Result<PointGrant, EngineError> {
        let points = self.rules.points_for(role, action).map_err(|err| match err {
            CatalogError::RoleNotConfigured(role) => LedgerError::UnsupportedRole(role),
            _ => LedgerError::InvalidAction {
                role,
                action: action.to_string(),
            },
        })?;
        self.award(AwardRequest::new(user.clone(), role, action, points))
    }

    /// Award points with full control over expiry and metadata.
    pub fn award(&self, request: AwardRequest) -> Result<PointGrant, EngineError> {
        let grant = self.ledger.award(request)?;
        self.events.publish(LedgerEvent::PointsAwarded {
            grant: grant.clone(),
        });
        Ok(grant)
    }

    // --- redemptions ---

    /// Redeem a catalog reward against the account's usable points.
    ///
    /// Validation, balance check, and depletion are atomic; the wallet
    /// credit happens after commit. A failed credit does not undo the
    /// depletion: the returned record carries status `Failed` and the
    /// redemption is queued for [`Self::retry_failed_credits`].
    pub fn redeem(
        &self,
        user: &UserId,
        role: Role,
        reward: &RewardId,
    ) -> Result<RedemptionRecord, EngineError> {
        let entry = self
            .catalog
            .get(reward)
            .ok_or_else(|| EngineError::RewardNotFound(reward.clone()))?;
        if !entry.is_active {
            return Err(EngineError::RewardInactive(reward.clone()));
        }
        if entry.points_required == 0 {
            return Err(EngineError::InvalidReward {
                reward: reward.clone(),
                reason: "zero point cost".into(),
            });
        }
        let allowed = self
            .rules
            .allows_reward_kind(role, &entry.kind)
            .map_err(|_| LedgerError::UnsupportedRole(role))?;
        if !allowed {
            return Err(EngineError::RewardNotAllowed {
                role,
                kind: entry.kind,
            });
        }

        let record = self.ledger.settle(
            user,
            role,
            entry.points_required,
            &entry.id,
            &entry.value,
        )?;

        match self.wallet.credit(&record.id, user, &record.value) {
            Ok(()) => {
                self.events.publish(LedgerEvent::RedemptionSettled {
                    record: record.clone(),
                });
                Ok(record)
            }
            Err(err) => {
                warn!(
                    redemption = %record.id,
                    user = %user,
                    reason = %err.reason,
                    "wallet credit failed, queueing for reconciliation"
                );
                let failed = self.ledger.update_redemption_status(
                    &record.id,
                    RedemptionStatus::Failed { reason: err.reason },
                )?;
                self.reconciliation.push(failed.id);
                self.events.publish(LedgerEvent::CreditFailed {
                    record: failed.clone(),
                });
                Ok(failed)
            }
        }
    }

    /// Re-attempt every queued wallet credit. Returns how many landed;
    /// credits that fail again go back on the queue.
    pub fn retry_failed_credits(&self) -> Result<usize, EngineError> {
        let mut recovered = 0;
        for id in self.reconciliation.drain() {
            let Some(record) = self.ledger.redemption(&id)? else {
                continue;
            };
            match self.wallet.credit(&record.id, &record.user, &record.value) {
                Ok(()) => {
                    let updated = self
                        .ledger
                        .update_redemption_status(&id, RedemptionStatus::Completed)?;
                    info!(redemption = %id, "credit reconciled");
                    self.events
                        .publish(LedgerEvent::CreditReconciled { record: updated });
                    recovered += 1;
                }
                Err(err) => {
                    warn!(redemption = %id, reason = %err.reason, "credit retry failed");
                    self.reconciliation.push(id);
                }
            }
        }
        Ok(recovered)
    }

    // --- queries ---

    /// Usable point balance right now.
    pub fn balance(&self, user: &UserId, role: Role) -> Result<u64, EngineError> {
        self.balance_at(user, role, Utc::now())
    }

    /// Usable point balance at a specific instant.
    pub fn balance_at(
        &self,
        user: &UserId,
        role: Role,
        as_of: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        Ok(self.ledger.balance(user, role, as_of)?)
    }

    /// Grant history, newest first. `limit` defaults from the config.
    pub fn history(
        &self,
        user: &UserId,
        role: Role,
        limit: Option<usize>,
    ) -> Result<Vec<PointGrant>, EngineError> {
        let limit = limit.unwrap_or(self.config.history_limit);
        Ok(self.ledger.history(user, role, limit)?)
    }

    /// Role leaderboard by usable points. `limit` defaults from the
    /// config.
    pub fn leaderboard(
        &self,
        role: Role,
        limit: Option<usize>,
    ) -> Result<LeaderboardProjection, EngineError> {
        let limit = limit.unwrap_or(self.config.leaderboard_limit);
        let board =
            ProjectionBuilder::leaderboard(self.ledger.as_ref(), role, limit, Utc::now())?;
        self.events.publish(LedgerEvent::LeaderboardQueried {
            role,
            entries: board.entries.len(),
        });
        Ok(board)
    }

    /// Rollup of one account's activity.
    pub fn account_summary(
        &self,
        user: &UserId,
        role: Role,
    ) -> Result<AccountSummary, EngineError> {
        Ok(ProjectionBuilder::account_summary(
            self.ledger.as_ref(),
            user,
            role,
            Utc::now(),
        )?)
    }

    /// Look up a redemption by id.
    pub fn redemption(
        &self,
        id: &RedemptionId,
    ) -> Result<Option<RedemptionRecord>, EngineError> {
        Ok(self.ledger.redemption(id)?)
    }

    /// All redemptions for an account, newest first.
    pub fn redemptions(
        &self,
        user: &UserId,
        role: Role,
    ) -> Result<Vec<RedemptionRecord>, EngineError> {
        Ok(self.ledger.redemptions_for(user, role)?)
    }

    /// Run the consistency auditor over one account.
    pub fn audit(&self, user: &UserId, role: Role) -> Result<AuditReport, EngineError> {
        Ok(LedgerAuditor::audit(self.ledger.as_ref(), user, role)?)
    }
}
