use tally_types::Role;
use thiserror::Error;

/// Errors produced by catalog construction and lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The role has no rules in the active configuration.
    #[error("role {0} is not configured")]
    RoleNotConfigured(Role),

    /// The action does not belong to the role's configured action set.
    #[error("action '{action}' is not configured for role {role}")]
    UnknownAction { role: Role, action: String },

    /// An action was configured with a zero point value.
    #[error("action '{action}' for role {role} is configured with zero points")]
    InvalidActionPoints { role: Role, action: String },

    /// A role was configured with a zero daily cap, which would block all awards.
    #[error("role {role} is configured with a zero daily cap")]
    InvalidDailyCap { role: Role },
}
