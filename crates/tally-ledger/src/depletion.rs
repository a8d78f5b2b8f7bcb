use tally_types::GrantId;

use crate::error::LedgerError;
use crate::records::PointGrant;

/// A planned debit against a single grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantDebit {
    pub grant: GrantId,
    /// Points to subtract from the grant's remainder.
    pub amount: u32,
    /// `true` if the debit takes the grant's remainder to zero, in which
    /// case applying the plan transitions the grant to `Consumed`.
    pub consumes: bool,
}

/// The full set of debits that pays for one redemption.
///
/// Planning is pure: it inspects a snapshot of usable grants and produces
/// the debits without mutating anything, so a shortfall can abort before
/// any state is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepletionPlan {
    pub required: u32,
    pub debits: Vec<GrantDebit>,
}

impl DepletionPlan {
    /// Total points debited across all grants. Always equals `required`
    /// for a successfully built plan.
    pub fn total(&self) -> u64 {
        self.debits.iter().map(|d| u64::from(d.amount)).sum()
    }
}

/// Plan an oldest-first depletion of `required` points.
///
/// `grants` must be the account's usable grants ordered by `created_at`
/// ascending. Walks the list, debiting `min(remaining_required, points)`
/// from each grant until the requirement is met.
///
/// Fails with `InvalidPoints` for a zero requirement and with
/// `InsufficientPoints` when the snapshot cannot cover it.
pub fn plan_oldest_first(
    grants: &[PointGrant],
    required: u32,
) -> Result<DepletionPlan, LedgerError> {
    if required == 0 {
        return Err(LedgerError::InvalidPoints);
    }

    let available: u64 = grants.iter().map(|g| u64::from(g.points)).sum();
    if available < u64::from(required) {
        return Err(LedgerError::InsufficientPoints {
            required,
            available,
        });
    }

    let mut remaining = required;
    let mut debits = Vec::new();
    for grant in grants {
        if remaining == 0 {
            break;
        }
        let amount = remaining.min(grant.points);
        if amount == 0 {
            continue;
        }
        debits.push(GrantDebit {
            grant: grant.id,
            amount,
            consumes: amount == grant.points,
        });
        remaining -= amount;
    }

    Ok(DepletionPlan { required, debits })
}
