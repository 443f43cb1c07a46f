use crate::logic::board::PromotionMode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a rollout result is credited to the nodes on its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueConvention {
    /// Each node accumulates the share of the side that moved into it.
    #[default]
    PerSide,
    /// Each node accumulates White's margin, negated when Black moved into it.
    ZeroSumNegated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsSettings {
    // Budget
    pub use_time_limit: bool,
    pub search_time_millis: u64,
    pub limit_num_of_playouts: bool,
    pub max_num_of_playouts: u32,

    // Rollouts
    pub playout_depth_limit: u32,
    pub promotions_to_search: PromotionMode,

    // Tree
    pub exploration_constant: f32,
    pub value_convention: ValueConvention,

    /// Fixed RNG seed for reproducible rollouts; OS entropy when absent.
    pub seed: Option<u64>,
}

impl Default for MctsSettings {
    fn default() -> Self {
        Self {
            use_time_limit: true,
            search_time_millis: 1000,
            limit_num_of_playouts: false,
            max_num_of_playouts: 1000,

            playout_depth_limit: 5,
            promotions_to_search: PromotionMode::All,

            exploration_constant: 1.0,
            value_convention: ValueConvention::PerSide,

            seed: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed settings: {e}"),
            Self::Invalid(reason) => write!(f, "invalid settings: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl MctsSettings {
    /// Parses settings, filling missing fields from [`Default`].
    pub fn load_from_json(json_str: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json_str)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::Invalid(
                "exploration_constant must be finite and non-negative",
            ));
        }
        if self.use_time_limit && self.search_time_millis == 0 {
            return Err(ConfigError::Invalid(
                "search_time_millis must be positive when use_time_limit is set",
            ));
        }
        Ok(())
    }

    /// Settings for a fixed playout budget with no clock, handy for tests and tooling.
    #[must_use]
    pub fn with_playouts(max_num_of_playouts: u32, playout_depth_limit: u32) -> Self {
        Self {
            use_time_limit: false,
            limit_num_of_playouts: true,
            max_num_of_playouts,
            playout_depth_limit,
            ..Self::default()
        }
    }
}
