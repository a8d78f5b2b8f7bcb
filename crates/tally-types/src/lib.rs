//! Foundation types for the tally points ledger.
//!
//! This crate provides the identity, role, and value types used throughout
//! the tally system. Every other tally crate depends on `tally-types`.
//!
//! # Key Types
//!
//! - [`UserId`] — Opaque user identifier supplied by the host marketplace
//! - [`Role`] — Marketplace role a user earns points under
//! - [`GrantId`] / [`RedemptionId`] — UUID v7 ledger record identifiers
//! - [`RewardId`] — Opaque reward catalog identifier
//! - [`RewardValue`] — Amount/currency pair credited by the wallet collaborator

pub mod error;
pub mod id;
pub mod money;
pub mod role;

pub use error::TypeError;
pub use id::{GrantId, RedemptionId, RewardId, UserId};
pub use money::RewardValue;
pub use role::Role;
