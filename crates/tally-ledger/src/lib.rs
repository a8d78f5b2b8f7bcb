//! Append-mostly points ledger for the tally gamification system.
//!
//! This crate is the heart of tally. It provides:
//! - Grant and redemption record types with explicit consumption state
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger` implementation for tests and embedding
//! - Oldest-first (FIFO) depletion planning for redemptions
//! - Projection builders (leaderboard, account summary)
//! - Account auditing (remainder bounds, consumption state, conservation)
//!
//! Grants are facts: they are appended by awards, depleted (never deleted)
//! by redemptions, and excluded from balances once expired or consumed.

pub mod depletion;
pub mod error;
pub mod memory;
pub mod projection;
pub mod records;
pub mod traits;
pub mod validation;

pub use depletion::{DepletionPlan, GrantDebit};
pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use projection::{
    AccountSummary, LeaderboardEntry, LeaderboardProjection, ProjectionBuilder,
};
pub use records::{
    AwardRequest, GrantStatus, PointGrant, RedemptionRecord, RedemptionStatus,
};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{AuditReport, LedgerAuditor, Violation, ViolationKind};
