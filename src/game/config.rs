//! Game configuration models.

use serde::{Deserialize, Serialize};

use super::entities::{Chips, MAX_PLAYERS};

/// Fixed table stakes and timing for a game. Blinds do not escalate
/// between rounds.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameConfig {
    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Chips each player starts with
    pub starting_stack: Chips,

    /// Display timer per turn, in seconds
    pub turn_seconds: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            small_blind: 10,
            big_blind: 20,
            starting_stack: 1_000,
            turn_seconds: 60,
        }
    }
}

impl GameConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind <= self.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if self.starting_stack < self.big_blind {
            return Err("Starting stack must cover the big blind".to_string());
        }

        if self.turn_seconds <= 0 {
            return Err("Turn timer must be positive".to_string());
        }

        Ok(())
    }

    /// Seats this configuration supports.
    #[must_use]
    pub fn max_players(&self) -> usize {
        MAX_PLAYERS
    }
}
