//! Arena configuration with documented constants
//!
//! Learning hyper-parameters, duel liveness guards and tournament settings
//! live here. Game rules that are part of the ruleset itself (AP ceiling,
//! SP ceiling, starting life) are in `combat::constants` instead.

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::core::error::{ArenaError, Result};

/// Settings for the tabular learners
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Starting value of every goodness cell
    ///
    /// 0.5 means "no idea": a fresh learner says yes half of the time.
    pub initial_goodness: f64,

    /// Starting value of the learning factor
    ///
    /// Each update blends `target * (1 - factor)` into the cell, so a
    /// smaller factor means outcomes pull harder.
    pub initial_factor: f64,

    /// Multiplier applied to the learning factor after every update
    ///
    /// At 0.9999 the factor halves roughly every 7,000 updates.
    pub factor_decay: f64,

    /// Sampling weight given to moves that are not legal right now
    ///
    /// Must stay positive so the weighted draw is always well defined.
    pub move_floor: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            initial_goodness: 0.5,
            initial_factor: 0.5,
            factor_decay: 0.9999,
            move_floor: 1e-6,
        }
    }
}

/// Settings for the neural learners
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralConfig {
    /// Width of the single hidden layer
    pub hidden_units: usize,

    /// Backpropagation step size
    pub learning_rate: f64,

    /// Seed for the initial weights
    ///
    /// Weights must start asymmetric or every hidden unit learns the same
    /// feature; a fixed seed keeps fresh networks reproducible.
    pub weight_seed: u64,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            hidden_units: 32,
            learning_rate: 0.3,
            weight_seed: 0x5eed,
        }
    }
}

/// Liveness guards for a single duel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Consecutive turn ends with both fighters at the AP ceiling that
    /// force a draw
    pub stalemate_turns: u32,

    /// Hard cap on turns before the duel is declared a draw
    ///
    /// Only reached by controllers that keep attacking without ever
    /// landing or being hit, which the stalemate rule cannot see.
    pub max_turns: u32,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            stalemate_turns: 2,
            max_turns: 10_000,
        }
    }
}

/// Settings for the round-robin runner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Worker threads for parallel duels (0 = rayon's default)
    pub threads: usize,
}

/// Configuration for the whole arena
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub learning: LearningConfig,
    pub neural: NeuralConfig,
    pub duel: DuelConfig,
    pub tournament: TournamentConfig,

    /// Seed for the process-wide dice
    ///
    /// When absent a fixed seed is used, so unseeded runs are still
    /// reproducible.
    pub rng_seed: Option<u64>,
}

impl ArenaConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ArenaConfig = toml::from_str(text)?;
        config.validate().map_err(ArenaError::Config)?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        let learning = &self.learning;
        if !(0.0..=1.0).contains(&learning.initial_goodness) {
            return Err(format!(
                "learning.initial_goodness ({}) must be within [0, 1]",
                learning.initial_goodness
            ));
        }
        if !(0.0..1.0).contains(&learning.initial_factor) {
            return Err(format!(
                "learning.initial_factor ({}) must be within [0, 1)",
                learning.initial_factor
            ));
        }
        if !(learning.factor_decay > 0.0 && learning.factor_decay < 1.0) {
            return Err(format!(
                "learning.factor_decay ({}) must be within (0, 1)",
                learning.factor_decay
            ));
        }
        if learning.move_floor <= 0.0 {
            return Err(format!(
                "learning.move_floor ({}) must be positive",
                learning.move_floor
            ));
        }

        if self.neural.hidden_units == 0 {
            return Err("neural.hidden_units must be at least 1".to_string());
        }
        if self.neural.learning_rate <= 0.0 {
            return Err(format!(
                "neural.learning_rate ({}) must be positive",
                self.neural.learning_rate
            ));
        }

        if self.duel.stalemate_turns == 0 {
            return Err("duel.stalemate_turns must be at least 1".to_string());
        }
        if self.duel.max_turns < self.duel.stalemate_turns {
            return Err(format!(
                "duel.max_turns ({}) must not be below duel.stalemate_turns ({})",
                self.duel.max_turns, self.duel.stalemate_turns
            ));
        }

        Ok(())
    }
}

static CONFIG: OnceLock<ArenaConfig> = OnceLock::new();

/// Get the global arena config (initializes with defaults if not set)
pub fn config() -> &'static ArenaConfig {
    CONFIG.get_or_init(ArenaConfig::default)
}

/// Set the global arena config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: ArenaConfig) -> std::result::Result<(), ArenaConfig> {
    CONFIG.set(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ArenaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning.initial_goodness, 0.5);
        assert_eq!(config.neural.hidden_units, 32);
        assert_eq!(config.duel.stalemate_turns, 2);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ArenaConfig::from_toml_str(
            r#"
            rng_seed = 42

            [learning]
            factor_decay = 0.999
            "#,
        )
        .expect("valid config");
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.learning.factor_decay, 0.999);
        assert_eq!(config.learning.initial_factor, 0.5);
        assert_eq!(config.neural.learning_rate, 0.3);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ArenaConfig::default();
        config.learning.factor_decay = 1.0;
        assert!(config.validate().is_err());

        let mut config = ArenaConfig::default();
        config.learning.move_floor = 0.0;
        assert!(config.validate().is_err());

        let mut config = ArenaConfig::default();
        config.duel.stalemate_turns = 0;
        assert!(config.validate().is_err());

        let err = ArenaConfig::from_toml_str("[neural]\nhidden_units = 0\n");
        assert!(matches!(err, Err(ArenaError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let err = ArenaConfig::from_toml_str("rng_seed = \"not a number\"");
        assert!(matches!(err, Err(ArenaError::Toml(_))));
    }
}
