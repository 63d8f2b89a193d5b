use serde::{Deserialize, Serialize};
use spellgrid_core::MAX_PLAYERS;

use crate::OrchestratorError;

/// Tunables of a match.
///
/// Every field has a default, so a configuration file only needs to name the
/// values it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Number of grid columns.
    pub width: i32,
    /// Number of grid rows.
    pub height: i32,
    /// Cells per carved room; larger values give a more closed map.
    pub room_factor: u32,
    /// Seed of every random decision in the match.
    pub seed: u64,
    /// Number of seats.
    pub players: u8,
    /// Portals placed when the arena is generated.
    pub portal_count: usize,
    /// Movement steps kept free around portals and players when placing
    /// portals.
    pub portal_safe_zone: u8,
    /// Spawn cells offered to a seat.
    pub spawn_options: usize,
    /// Movement steps kept free around portals and players when offering
    /// spawn cells.
    pub spawn_safe_zone: u8,
    /// Movement budget of a single move phase, origin included.
    pub move_steps: u8,
    /// Turns a portal rests after granting a spell.
    pub portal_cooldown: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            room_factor: 40,
            seed: 0,
            players: 2,
            portal_count: 16,
            portal_safe_zone: 15,
            spawn_options: 3,
            spawn_safe_zone: 15,
            move_steps: 15,
            portal_cooldown: 3,
        }
    }
}

impl ArenaConfig {
    /// Rejects configurations the orchestrator cannot run.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.players == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "at least one player is required",
            ));
        }
        if usize::from(self.players) > MAX_PLAYERS {
            return Err(OrchestratorError::InvalidConfig(
                "no more than 32 players are supported",
            ));
        }
        if self.width < 3 || self.height < 3 {
            return Err(OrchestratorError::InvalidConfig(
                "the grid must be at least 3x3",
            ));
        }
        if self.room_factor == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "room factor must be greater than zero",
            ));
        }
        if self.spawn_options == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "at least one spawn option must be offered",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ArenaConfig;
    use crate::OrchestratorError;

    #[test]
    fn defaults_are_valid() {
        let config = ArenaConfig::default();
        assert_eq!(config.width, 40);
        assert_eq!(config.move_steps, 15);
        assert_eq!(config.portal_cooldown, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_files_keep_defaults() {
        let config: ArenaConfig = toml::from_str("players = 4\nseed = 99\n").expect("config");
        assert_eq!(config.players, 4);
        assert_eq!(config.seed, 99);
        assert_eq!(config.height, 30);
        assert_eq!(config.spawn_options, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ArenaConfig>("playres = 4\n").is_err());
    }

    #[test]
    fn seat_count_is_bounded() {
        let empty = ArenaConfig {
            players: 0,
            ..ArenaConfig::default()
        };
        assert!(matches!(
            empty.validate(),
            Err(OrchestratorError::InvalidConfig(_))
        ));

        let crowded = ArenaConfig {
            players: 33,
            ..ArenaConfig::default()
        };
        assert!(crowded.validate().is_err());

        let full = ArenaConfig {
            players: 32,
            ..ArenaConfig::default()
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn degenerate_arenas_are_rejected() {
        let narrow = ArenaConfig {
            width: 2,
            ..ArenaConfig::default()
        };
        assert!(narrow.validate().is_err());

        let solid = ArenaConfig {
            room_factor: 0,
            ..ArenaConfig::default()
        };
        assert!(solid.validate().is_err());
    }
}
