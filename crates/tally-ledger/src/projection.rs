use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_types::{Role, UserId};

use crate::error::LedgerError;
use crate::traits::LedgerReader;

/// One row of a role leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position. Equal totals still get distinct ranks, assigned
    /// in user-id order.
    pub rank: usize,
    pub user: UserId,
    /// Usable points at the projection instant.
    pub points: u64,
}

/// A ranking of users within one role by usable points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardProjection {
    pub role: Role,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}

/// Per-account rollup of grant and redemption activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub user: UserId,
    pub role: Role,
    /// Points spendable right now.
    pub usable_points: u64,
    /// All points ever awarded, including expired and consumed grants.
    pub lifetime_points: u64,
    /// Points depleted by redemptions, regardless of credit outcome.
    pub spent_points: u64,
    pub grant_count: usize,
    pub redemption_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Builds derived read models from any `LedgerReader`.
///
/// Projections are computed on demand from committed grants; nothing is
/// cached, so a projection is always consistent with the reads that
/// produced it.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    /// Rank users by usable points under `role` at `as_of`, descending.
    /// Ties break by user id ascending. `limit` truncates the result
    /// after ranking. Only usable grants are grouped: a user whose grants
    /// have all expired or been consumed does not appear at all.
    pub fn leaderboard(
        reader: &dyn LedgerReader,
        role: Role,
        limit: usize,
        as_of: DateTime<Utc>,
    ) -> Result<LeaderboardProjection, LedgerError> {
        let mut totals: HashMap<UserId, u64> = HashMap::new();
        for grant in reader.grants_for_role(role)? {
            if grant.usable_at(as_of) {
                *totals.entry(grant.user.clone()).or_insert(0) += u64::from(grant.points);
            }
        }

        let mut ranked: Vec<(UserId, u64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);

        let entries = ranked
            .into_iter()
            .enumerate()
            .map(|(i, (user, points))| LeaderboardEntry {
                rank: i + 1,
                user,
                points,
            })
            .collect();

        Ok(LeaderboardProjection {
            role,
            generated_at: as_of,
            entries,
        })
    }

    /// Roll up one account's grants and redemptions.
    pub fn account_summary(
        reader: &dyn LedgerReader,
        user: &UserId,
        role: Role,
        as_of: DateTime<Utc>,
    ) -> Result<AccountSummary, LedgerError> {
        let grants = reader.grants(user, role)?;
        let redemptions = reader.redemptions_for(user, role)?;

        let usable_points = grants
            .iter()
            .filter(|g| g.usable_at(as_of))
            .map(|g| u64::from(g.points))
            .sum();
        let lifetime_points = grants.iter().map(|g| u64::from(g.awarded_points)).sum();
        let spent_points = redemptions
            .iter()
            .map(|r| u64::from(r.points_spent))
            .sum();

        Ok(AccountSummary {
            user: user.clone(),
            role,
            usable_points,
            lifetime_points,
            spent_points,
            grant_count: grants.len(),
            redemption_count: redemptions.len(),
            generated_at: as_of,
        })
    }
}
