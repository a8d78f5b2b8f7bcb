use tally_types::{GrantId, Role, UserId};

use crate::error::LedgerError;
use crate::records::GrantStatus;
use crate::traits::LedgerReader;

/// Classification of an audit finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// A grant's remainder is larger than the points originally awarded.
    RemainderExceedsAward { awarded: u32, remaining: u32 },
    /// A grant is marked consumed but still carries points.
    ConsumedWithRemainder { remaining: u32 },
    /// A grant's consumption instant precedes its creation instant.
    ConsumedBeforeCreation,
    /// Awarded minus remaining points does not equal the points spent
    /// across the account's redemptions.
    SpentMismatch { depleted: u64, spent: u64 },
}

/// One audit finding, tied to the grant that triggered it where there
/// is one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub grant: Option<GrantId>,
}

/// Outcome of auditing one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    pub user: UserId,
    pub role: Role,
    pub grants_checked: usize,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Returns `true` if no violations were found.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Consistency checker for ledger accounts.
///
/// The ledger upholds these invariants by construction; the auditor
/// exists to catch corruption introduced by external persistence or
/// manual intervention, and to back the conservation property in tests.
pub struct LedgerAuditor;

impl LedgerAuditor {
    /// Audit a single account's grants and redemptions.
    pub fn audit(
        reader: &dyn LedgerReader,
        user: &UserId,
        role: Role,
    ) -> Result<AuditReport, LedgerError> {
        let grants = reader.grants(user, role)?;
        let redemptions = reader.redemptions_for(user, role)?;
        let mut violations = Vec::new();

        let mut awarded: u64 = 0;
        let mut remaining: u64 = 0;
        for grant in &grants {
            awarded += u64::from(grant.awarded_points);
            remaining += u64::from(grant.points);

            if grant.points > grant.awarded_points {
                violations.push(Violation {
                    kind: ViolationKind::RemainderExceedsAward {
                        awarded: grant.awarded_points,
                        remaining: grant.points,
                    },
                    grant: Some(grant.id),
                });
            }
            if let GrantStatus::Consumed { at } = grant.status {
                if grant.points > 0 {
                    violations.push(Violation {
                        kind: ViolationKind::ConsumedWithRemainder {
                            remaining: grant.points,
                        },
                        grant: Some(grant.id),
                    });
                }
                if at < grant.created_at {
                    violations.push(Violation {
                        kind: ViolationKind::ConsumedBeforeCreation,
                        grant: Some(grant.id),
                    });
                }
            }
        }

        // Conservation: every depleted point is accounted for by a
        // redemption. Failed wallet credits still count; their depletion
        // stands.
        let depleted = awarded - remaining.min(awarded);
        let spent: u64 = redemptions
            .iter()
            .map(|r| u64::from(r.points_spent))
            .sum();
        if depleted != spent {
            violations.push(Violation {
                kind: ViolationKind::SpentMismatch { depleted, spent },
                grant: None,
            });
        }

        Ok(AuditReport {
            user: user.clone(),
            role,
            grants_checked: grants.len(),
            violations,
        })
    }
}
