use serde::{Deserialize, Serialize};

/// Tunables for the engine facade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default number of grants returned by history queries.
    pub history_limit: usize,
    /// Default number of rows returned by leaderboard queries.
    pub leaderboard_limit: usize,
    /// Buffer size of the event broadcast channel. Slow subscribers that
    /// fall more than this many events behind start losing events.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            leaderboard_limit: 10,
            event_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Builder-style: set the default history page size.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Builder-style: set the default leaderboard size.
    pub fn with_leaderboard_limit(mut self, limit: usize) -> Self {
        self.leaderboard_limit = limit;
        self
    }

    /// Builder-style: set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = EngineConfig::default();
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.leaderboard_limit, 10);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::default()
            .with_history_limit(5)
            .with_leaderboard_limit(3)
            .with_event_capacity(16);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.leaderboard_limit, 3);
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn deserializes_with_defaults_for_missing_fields() {
        let config: EngineConfig = serde_json::from_str(r#"{"history_limit": 20}"#).unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.leaderboard_limit, 10);
    }
}
