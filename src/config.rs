//! Simulation configuration.
//!
//! Everything needed to start a run: seed, initial world, interaction
//! policy and replay settings. Loaded from JSON; every field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game::clock::ClockAuthority;
use crate::game::dispatch::InteractionMode;
use crate::game::state::{InvalidState, SimulationState, WorldState, DEFAULT_SEED};
use crate::game::tick::StepConfig;
use crate::replay::verify::CHECKPOINT_INTERVAL;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// Not valid JSON for [`SimConfig`]
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// `checkpoint_interval` was zero
    #[error("checkpoint interval must be non-zero")]
    ZeroInterval,

    /// The initial state fails [`SimulationState::validate`]
    #[error("invalid initial state: {0}")]
    Invalid(#[from] InvalidState),
}

/// Run configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// PRNG seed (zero is remapped)
    pub seed: u32,
    /// Calendar, avatar position and flags at tick 0
    pub initial_world: WorldState,
    /// Ghost or avatar interaction policy
    pub mode: InteractionMode,
    /// Who advances the calendar
    pub clock: ClockAuthority,
    /// Replay checkpoint interval in ticks
    pub checkpoint_interval: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            initial_world: WorldState::default(),
            mode: InteractionMode::Avatar,
            clock: ClockAuthority::Local,
            checkpoint_interval: CHECKPOINT_INTERVAL,
        }
    }
}

impl SimConfig {
    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if config.checkpoint_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        config.initial_state().validate()?;
        Ok(config)
    }

    /// Fresh state at tick 0.
    pub fn initial_state(&self) -> SimulationState {
        let mut world = self.initial_world.clone();
        world.set_avatar_cell(world.avatar_cell());
        SimulationState::new(self.seed, world)
    }

    /// Stepper settings derived from this config.
    pub fn step_config(&self) -> StepConfig {
        StepConfig {
            mode: self.mode,
            clock: self.clock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = SimConfig::from_json("{}").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.initial_state(), SimulationState::default());
    }

    #[test]
    fn test_partial_override() {
        let config = SimConfig::from_json(
            r#"{ "seed": 7, "mode": "ghost", "clock": "external", "initial_world": { "hour": 23 } }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.mode, InteractionMode::Ghost);
        assert_eq!(config.step_config().clock, ClockAuthority::External);
        assert_eq!(config.initial_world.hour, 23);
        assert_eq!(config.initial_world.map_x, 0x133);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            SimConfig::from_json(r#"{ "checkpoint_interval": 0 }"#),
            Err(ConfigError::ZeroInterval)
        ));
    }

    #[test]
    fn test_invalid_initial_world_rejected() {
        let err = SimConfig::from_json(r#"{ "initial_world": { "minute": 4294967295 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(InvalidState::OutOfRange { field: "minute", value: 4294967295 })
        ));

        assert!(matches!(
            SimConfig::from_json(r#"{ "initial_world": { "day": 0 } }"#),
            Err(ConfigError::Invalid(InvalidState::OutOfRange { field: "day", .. }))
        ));
        assert!(matches!(
            SimConfig::from_json(r#"{ "initial_world": { "month": 14 } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_start_position_clamped() {
        let config = SimConfig::from_json(r#"{ "initial_world": { "map_x": 5000 } }"#).unwrap();
        assert_eq!(config.initial_state().world.map_x, 0x3ff);
    }
}
