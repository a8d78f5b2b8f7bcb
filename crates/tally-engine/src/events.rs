use tokio::sync::broadcast;
use tracing::debug;

use tally_ledger::{PointGrant, RedemptionRecord};
use tally_types::Role;

/// Notifications emitted after ledger state changes commit.
///
/// Events are observational: every state change is already durable in the
/// ledger when its event is published, and a missed event never implies a
/// missed state change.
#[derive(Clone, Debug)]
pub enum LedgerEvent {
    /// A grant was appended by an award.
    PointsAwarded { grant: PointGrant },
    /// A redemption committed and its wallet credit succeeded.
    RedemptionSettled { record: RedemptionRecord },
    /// A redemption committed but its wallet credit failed; the point
    /// deduction stands and the redemption awaits reconciliation.
    CreditFailed { record: RedemptionRecord },
    /// A previously failed credit landed on retry.
    CreditReconciled { record: RedemptionRecord },
    /// A leaderboard projection was served. Emitted for audit consumers;
    /// carries no ledger state change.
    LeaderboardQueried { role: Role, entries: usize },
}

impl LedgerEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PointsAwarded { .. } => "points_awarded",
            Self::RedemptionSettled { .. } => "redemption_settled",
            Self::CreditFailed { .. } => "credit_failed",
            Self::CreditReconciled { .. } => "credit_reconciled",
            Self::LeaderboardQueried { .. } => "leaderboard_queried",
        }
    }
}

/// Fan-out of [`LedgerEvent`]s to any number of subscribers.
///
/// Backed by a broadcast channel: publishing never blocks, and a
/// subscriber that falls behind the channel capacity loses the oldest
/// events rather than stalling the publisher.
pub struct EventHub {
    tx: broadcast::Sender<LedgerEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Open a new subscription. Only events published after this call are
    /// delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub(crate) fn publish(&self, event: LedgerEvent) {
        debug!(kind = event.kind(), "publishing ledger event");
        // With zero subscribers `send` errors; the event is simply dropped.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use tally_ledger::GrantStatus;
    use tally_types::{GrantId, Role, UserId};

    use super::*;

    fn grant() -> PointGrant {
        PointGrant {
            id: GrantId::new(),
            user: UserId::new("u1"),
            role: Role::Customer,
            action: "order_placed".into(),
            awarded_points: 10,
            points: 10,
            created_at: Utc::now(),
            status: GrantStatus::Active { expires_at: None },
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn subscribers_receive_published_events() {
        let hub = EventHub::new(8);
        let mut rx = hub.subscribe();

        hub.publish(LedgerEvent::PointsAwarded { grant: grant() });

        match rx.try_recv().unwrap() {
            LedgerEvent::PointsAwarded { grant } => assert_eq!(grant.points, 10),
            other => panic!("unexpected event: {}", other.kind()),
        }
    }

    #[test]
    fn publishing_without_subscribers_is_a_no_op() {
        let hub = EventHub::new(8);
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(LedgerEvent::PointsAwarded { grant: grant() });
    }

    #[test]
    fn late_subscribers_miss_earlier_events() {
        let hub = EventHub::new(8);
        hub.publish(LedgerEvent::PointsAwarded { grant: grant() });

        let mut rx = hub.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
