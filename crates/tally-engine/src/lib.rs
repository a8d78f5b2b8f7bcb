//! Redemption engine and embedding facade for the tally gamification
//! system.
//!
//! This crate wires the ledger to its external collaborators:
//! - [`TallyEngine`], the one-stop facade hosts embed
//! - Reward validation against the catalog and per-role kind rules
//! - Post-commit wallet credits with idempotent retry via a
//!   reconciliation queue
//! - [`EventHub`] fan-out of committed state changes
//!
//! The engine never rolls a redemption back: once points are depleted the
//! deduction stands, and a failed wallet credit is reconciled forward.

pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod service;

pub use config::EngineConfig;
pub use effects::{CreditError, InMemoryWallet, ReconciliationQueue, WalletGateway};
pub use error::EngineError;
pub use events::{EventHub, LedgerEvent};
pub use service::TallyEngine;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{Duration, Utc};
    use tally_catalog::{
        ActionCatalog, CatalogConfig, InMemoryRewardCatalog, RewardEntry, RewardKind,
        RoleRules,
    };
    use tally_ledger::{AwardRequest, LedgerError, RedemptionStatus};
    use tally_types::{RewardId, RewardValue, Role, UserId};

    use super::*;

    fn rules() -> ActionCatalog {
        ActionCatalog::from_config(
            CatalogConfig::default()
                .with_role(
                    Role::Customer,
                    RoleRules::default()
                        .with_action("order_placed", 20)
                        .with_action("review_posted", 10)
                        .with_daily_cap(100)
                        .with_reward_kind(RewardKind::Cashback),
                )
                .with_role(
                    Role::Driver,
                    RoleRules::default()
                        .with_action("trip_completed", 15)
                        .with_reward_kind(RewardKind::Cashback)
                        .with_reward_kind(RewardKind::Voucher),
                ),
        )
        .unwrap()
    }

    fn reward(id: &str, points: u32, kind: RewardKind, active: bool) -> RewardEntry {
        RewardEntry {
            id: RewardId::new(id),
            points_required: points,
            kind,
            value: RewardValue::new(5.0, "USD"),
            is_active: active,
        }
    }

    fn harness() -> (TallyEngine, Arc<InMemoryWallet>) {
        let catalog = Arc::new(InMemoryRewardCatalog::new());
        catalog.insert(reward("coffee", 25, RewardKind::Cashback, true));
        catalog.insert(reward("retired", 10, RewardKind::Cashback, false));
        catalog.insert(reward("freebie", 0, RewardKind::Cashback, true));
        catalog.insert(reward("ride-voucher", 30, RewardKind::Voucher, true));

        let wallet = Arc::new(InMemoryWallet::new());
        let gateway: Arc<dyn WalletGateway> = wallet.clone();
        let engine = TallyEngine::new(rules(), catalog, gateway);
        (engine, wallet)
    }

    fn user(id: &str) -> UserId {
        UserId::new(id)
    }

    // --- 1. awards and balances ---

    #[test]
    fn action_awards_configured_points() {
        let (engine, _) = harness();
        let grant = engine
            .record_action(&user("u1"), Role::Customer, "order_placed")
            .unwrap();
        assert_eq!(grant.points, 20);
        assert_eq!(engine.balance(&user("u1"), Role::Customer).unwrap(), 20);
    }

    #[test]
    fn unknown_action_and_role_are_rejected() {
        let (engine, _) = harness();
        assert!(matches!(
            engine
                .record_action(&user("u1"), Role::Customer, "teleported")
                .unwrap_err(),
            EngineError::Ledger(LedgerError::InvalidAction { .. })
        ));
        assert_eq!(
            engine
                .record_action(&user("u1"), Role::Staff, "shift_completed")
                .unwrap_err(),
            EngineError::Ledger(LedgerError::UnsupportedRole(Role::Staff))
        );
    }

    #[test]
    fn daily_cap_applies_through_the_facade() {
        let (engine, _) = harness();
        for _ in 0..5 {
            engine
                .record_action(&user("u1"), Role::Customer, "order_placed")
                .unwrap();
        }
        assert!(matches!(
            engine
                .record_action(&user("u1"), Role::Customer, "review_posted")
                .unwrap_err(),
            EngineError::Ledger(LedgerError::DailyCapExceeded { cap: 100, .. })
        ));
    }

    #[test]
    fn expired_grants_leave_the_balance() {
        let (engine, _) = harness();
        let past = Utc::now() - Duration::seconds(1);
        engine
            .award(
                AwardRequest::new(user("u1"), Role::Customer, "order_placed", 20)
                    .expiring_at(past),
            )
            .unwrap();
        engine
            .record_action(&user("u1"), Role::Customer, "review_posted")
            .unwrap();

        assert_eq!(engine.balance(&user("u1"), Role::Customer).unwrap(), 10);
    }

    // --- 2. redemption ---

    #[test]
    fn redemption_depletes_oldest_grants_first() {
        let (engine, wallet) = harness();
        engine
            .record_action(&user("u1"), Role::Customer, "order_placed")
            .unwrap();
        engine
            .record_action(&user("u1"), Role::Customer, "review_posted")
            .unwrap();

        let record = engine
            .redeem(&user("u1"), Role::Customer, &RewardId::new("coffee"))
            .unwrap();
        assert_eq!(record.points_spent, 25);
        assert!(record.status.is_completed());
        assert!(wallet.credited(&record.id));

        assert_eq!(engine.balance(&user("u1"), Role::Customer).unwrap(), 5);
        let history = engine.history(&user("u1"), Role::Customer, None).unwrap();
        assert_eq!(history[0].action, "review_posted");
        assert_eq!(history[0].points, 5);
        assert_eq!(history[1].points, 0);
        assert!(history[1].status.is_consumed());
    }

    #[test]
    fn shortfall_rejects_without_mutation() {
        let (engine, wallet) = harness();
        engine
            .record_action(&user("u1"), Role::Customer, "order_placed")
            .unwrap();

        let err = engine
            .redeem(&user("u1"), Role::Customer, &RewardId::new("coffee"))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Ledger(LedgerError::InsufficientPoints {
                required: 25,
                available: 20
            })
        );
        assert_eq!(engine.balance(&user("u1"), Role::Customer).unwrap(), 20);
        assert_eq!(wallet.credit_count(), 0);
        assert!(engine.redemptions(&user("u1"), Role::Customer).unwrap().is_empty());
    }

    #[test]
    fn reward_validation_precedes_the_balance_check() {
        let (engine, _) = harness();
        // No points at all; validation errors must surface first.
        assert_eq!(
            engine
                .redeem(&user("u1"), Role::Customer, &RewardId::new("missing"))
                .unwrap_err(),
            EngineError::RewardNotFound(RewardId::new("missing"))
        );
        assert_eq!(
            engine
                .redeem(&user("u1"), Role::Customer, &RewardId::new("retired"))
                .unwrap_err(),
            EngineError::RewardInactive(RewardId::new("retired"))
        );
        assert!(matches!(
            engine
                .redeem(&user("u1"), Role::Customer, &RewardId::new("freebie"))
                .unwrap_err(),
            EngineError::InvalidReward { .. }
        ));
        assert_eq!(
            engine
                .redeem(&user("u1"), Role::Customer, &RewardId::new("ride-voucher"))
                .unwrap_err(),
            EngineError::RewardNotAllowed {
                role: Role::Customer,
                kind: RewardKind::Voucher
            }
        );
    }

    // --- 3. credit failure and reconciliation ---

    #[test]
    fn failed_credit_keeps_the_deduction_and_reconciles_forward() {
        let (engine, wallet) = harness();
        engine
            .record_action(&user("u1"), Role::Customer, "order_placed")
            .unwrap();
        engine
            .record_action(&user("u1"), Role::Customer, "review_posted")
            .unwrap();

        wallet.set_failing(true);
        let record = engine
            .redeem(&user("u1"), Role::Customer, &RewardId::new("coffee"))
            .unwrap();
        assert!(matches!(record.status, RedemptionStatus::Failed { .. }));
        assert!(!wallet.credited(&record.id));
        // The deduction stands despite the failed credit.
        assert_eq!(engine.balance(&user("u1"), Role::Customer).unwrap(), 5);
        assert_eq!(engine.pending_reconciliations(), 1);

        // Retry while the wallet is still down re-queues it.
        assert_eq!(engine.retry_failed_credits().unwrap(), 0);
        assert_eq!(engine.pending_reconciliations(), 1);

        wallet.set_failing(false);
        assert_eq!(engine.retry_failed_credits().unwrap(), 1);
        assert_eq!(engine.pending_reconciliations(), 0);
        assert!(wallet.credited(&record.id));
        assert_eq!(wallet.credit_count(), 1);

        let reconciled = engine.redemption(&record.id).unwrap().unwrap();
        assert!(reconciled.status.is_completed());
    }

    // --- 4. projections and history ---

    #[test]
    fn leaderboard_orders_by_usable_points() {
        let (engine, _) = harness();
        for _ in 0..3 {
            engine
                .record_action(&user("u1"), Role::Customer, "review_posted")
                .unwrap();
        }
        engine
            .record_action(&user("u2"), Role::Customer, "order_placed")
            .unwrap();
        engine
            .record_action(&user("u2"), Role::Customer, "order_placed")
            .unwrap();
        engine
            .record_action(&user("u2"), Role::Customer, "review_posted")
            .unwrap();
        engine
            .record_action(&user("u3"), Role::Customer, "review_posted")
            .unwrap();

        let board = engine.leaderboard(Role::Customer, None).unwrap();
        let ranked: Vec<_> = board
            .entries
            .iter()
            .map(|e| (e.rank, e.user.as_str(), e.points))
            .collect();
        assert_eq!(ranked, vec![(1, "u2", 50), (2, "u1", 30), (3, "u3", 10)]);
    }

    #[test]
    fn account_summary_reflects_all_activity() {
        let (engine, _) = harness();
        engine
            .record_action(&user("u1"), Role::Customer, "order_placed")
            .unwrap();
        engine
            .record_action(&user("u1"), Role::Customer, "review_posted")
            .unwrap();
        engine
            .redeem(&user("u1"), Role::Customer, &RewardId::new("coffee"))
            .unwrap();

        let summary = engine.account_summary(&user("u1"), Role::Customer).unwrap();
        assert_eq!(summary.usable_points, 5);
        assert_eq!(summary.lifetime_points, 30);
        assert_eq!(summary.spent_points, 25);
        assert_eq!(summary.redemption_count, 1);
    }

    // --- 5. events ---

    #[test]
    fn events_follow_the_award_and_redemption_lifecycle() {
        let (engine, wallet) = harness();
        let mut rx = engine.events().subscribe();

        engine
            .record_action(&user("u1"), Role::Customer, "order_placed")
            .unwrap();
        engine
            .record_action(&user("u1"), Role::Customer, "review_posted")
            .unwrap();
        wallet.set_failing(true);
        engine
            .redeem(&user("u1"), Role::Customer, &RewardId::new("coffee"))
            .unwrap();
        wallet.set_failing(false);
        engine.retry_failed_credits().unwrap();
        engine.leaderboard(Role::Customer, None).unwrap();

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "points_awarded",
                "points_awarded",
                "credit_failed",
                "credit_reconciled",
                "leaderboard_queried"
            ]
        );
    }

    // --- 6. concurrency ---

    #[test]
    fn concurrent_redemptions_cannot_overdraw() {
        let (engine, wallet) = harness();
        let engine = Arc::new(engine);
        engine
            .record_action(&user("u1"), Role::Customer, "order_placed")
            .unwrap();
        engine
            .record_action(&user("u1"), Role::Customer, "review_posted")
            .unwrap();

        // 30 points available, each redemption costs 25: only one can win.
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    engine.redeem(&user("u1"), Role::Customer, &RewardId::new("coffee"))
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(engine.balance(&user("u1"), Role::Customer).unwrap(), 5);
        assert_eq!(wallet.credit_count(), 1);
    }

    // --- 7. conservation ---

    #[test]
    fn books_balance_after_mixed_activity() {
        let (engine, wallet) = harness();
        for _ in 0..3 {
            engine
                .record_action(&user("u1"), Role::Customer, "order_placed")
                .unwrap();
        }
        engine
            .redeem(&user("u1"), Role::Customer, &RewardId::new("coffee"))
            .unwrap();
        wallet.set_failing(true);
        engine
            .redeem(&user("u1"), Role::Customer, &RewardId::new("coffee"))
            .unwrap();

        let report = engine.audit(&user("u1"), Role::Customer).unwrap();
        assert!(report.is_clean(), "violations: {:?}", report.violations);
        assert_eq!(engine.balance(&user("u1"), Role::Customer).unwrap(), 10);
    }
}
