use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use tally_types::Role;

use crate::error::CatalogError;
use crate::rewards::RewardKind;

/// Earning and redemption rules for a single role.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleRules {
    /// Action identifier -> points earned per occurrence.
    pub action_points: HashMap<String, u32>,
    /// Maximum points a user may earn under this role per UTC day.
    /// `None` means uncapped.
    pub daily_cap: Option<u32>,
    /// Reward kinds this role may redeem.
    pub allowed_reward_kinds: HashSet<RewardKind>,
}

impl RoleRules {
    /// Builder-style: register an earning action.
    pub fn with_action(mut self, action: impl Into<String>, points: u32) -> Self {
        self.action_points.insert(action.into(), points);
        self
    }

    /// Builder-style: set the daily earning cap.
    pub fn with_daily_cap(mut self, cap: u32) -> Self {
        self.daily_cap = Some(cap);
        self
    }

    /// Builder-style: allow a reward kind.
    pub fn with_reward_kind(mut self, kind: RewardKind) -> Self {
        self.allowed_reward_kinds.insert(kind);
        self
    }
}

/// Full per-role configuration, as supplied by the host at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub roles: HashMap<Role, RoleRules>,
}

impl CatalogConfig {
    /// Builder-style: set the rules for a role.
    pub fn with_role(mut self, role: Role, rules: RoleRules) -> Self {
        self.roles.insert(role, rules);
        self
    }
}

/// Resolved, validated earning rules.
///
/// Built once at startup from a [`CatalogConfig`]; construction fails fast
/// on invalid entries (zero-point actions, zero daily caps) so lookups at
/// award time can only fail with "unknown role/action".
#[derive(Clone, Debug)]
pub struct ActionCatalog {
    roles: HashMap<Role, RoleRules>,
}

impl ActionCatalog {
    /// Validate a configuration and resolve it into a catalog.
    pub fn from_config(config: CatalogConfig) -> Result<Self, CatalogError> {
        for (role, rules) in &config.roles {
            for (action, points) in &rules.action_points {
                if *points == 0 {
                    return Err(CatalogError::InvalidActionPoints {
                        role: *role,
                        action: action.clone(),
                    });
                }
            }
            if rules.daily_cap == Some(0) {
                return Err(CatalogError::InvalidDailyCap { role: *role });
            }
        }
        Ok(Self {
            roles: config.roles,
        })
    }

    /// Returns `true` if the role has configured rules.
    pub fn supports_role(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    /// Points earned by one occurrence of `action` under `role`.
    pub fn points_for(&self, role: Role, action: &str) -> Result<u32, CatalogError> {
        let rules = self
            .roles
            .get(&role)
            .ok_or(CatalogError::RoleNotConfigured(role))?;
        rules
            .action_points
            .get(action)
            .copied()
            .ok_or_else(|| CatalogError::UnknownAction {
                role,
                action: action.to_string(),
            })
    }

    /// Returns `true` if `action` belongs to the role's configured set.
    pub fn knows_action(&self, role: Role, action: &str) -> Result<bool, CatalogError> {
        let rules = self
            .roles
            .get(&role)
            .ok_or(CatalogError::RoleNotConfigured(role))?;
        Ok(rules.action_points.contains_key(action))
    }

    /// The role's daily earning cap, if any.
    pub fn daily_cap(&self, role: Role) -> Result<Option<u32>, CatalogError> {
        self.roles
            .get(&role)
            .map(|rules| rules.daily_cap)
            .ok_or(CatalogError::RoleNotConfigured(role))
    }

    /// Returns `true` if the role may redeem rewards of the given kind.
    pub fn allows_reward_kind(&self, role: Role, kind: &RewardKind) -> Result<bool, CatalogError> {
        let rules = self
            .roles
            .get(&role)
            .ok_or(CatalogError::RoleNotConfigured(role))?;
        Ok(rules.allowed_reward_kinds.contains(kind))
    }
}
