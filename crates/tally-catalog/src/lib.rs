//! Earning rules and reward catalog boundary for the tally points ledger.
//!
//! The host marketplace decides which actions earn how many points for each
//! role, what the daily earning caps are, and which reward kinds each role
//! may redeem. This crate turns that configuration data into typed,
//! startup-validated lookups:
//!
//! - [`CatalogConfig`] / [`RoleRules`] — serde-friendly configuration input
//! - [`ActionCatalog`] — resolved enum-keyed lookups, failing fast on
//!   invalid entries instead of at call time
//! - [`RewardCatalog`] — read-only collaborator boundary for reward entries,
//!   with [`InMemoryRewardCatalog`] for tests and embedding

pub mod config;
pub mod error;
pub mod rewards;

pub use config::{ActionCatalog, CatalogConfig, RoleRules};
pub use error::CatalogError;
pub use rewards::{InMemoryRewardCatalog, RewardCatalog, RewardEntry, RewardKind};
