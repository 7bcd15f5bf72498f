//! Collaborator store traits for dependency injection and testability.
//!
//! The engine never loads entity graphs lazily: every trait here hands back
//! fully-hydrated, immutable snapshots, and every mutation is an explicit
//! call. Persistence technology is the embedder's business; the in-memory
//! implementations in [`memory`] cover tests, demos and embedding.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::game::entities::{Card, Deck, GameId, Player, PlayerId, Round, RoundId, Turn};
use crate::game::errors::EngineResult;

pub mod memory;

pub use memory::{
    MemoryPlayers, MemoryRounds, MemoryTurns, RecordingAchievements, RecordingNotifications,
    ShuffledDeckSource,
};

/// Seated-player snapshots and stack bookkeeping.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// Players seated in the game, hydrated and sorted by seat.
    async fn players_in_game(&self, game_id: GameId) -> EngineResult<Vec<Player>>;

    /// Apply a chip delta to the player's stack.
    async fn update_stack(&self, player_id: PlayerId, delta: i64) -> EngineResult<()>;

    /// Move the player to another seat.
    async fn update_seat(&self, player_id: PlayerId, seat_idx: usize) -> EngineResult<()>;

    /// Replace the player's hole cards.
    async fn save_hand(&self, player_id: PlayerId, hand: Vec<Card>) -> EngineResult<()>;

    /// Unseat the player.
    async fn remove_player(&self, player_id: PlayerId) -> EngineResult<()>;
}

/// Round snapshot persistence.
#[async_trait]
pub trait RoundStore: Send + Sync {
    /// Load a round snapshot.
    async fn load(&self, round_id: RoundId) -> EngineResult<Round>;

    /// Persist the round snapshot, inserting or replacing.
    async fn save(&self, round: &Round) -> EngineResult<()>;

    /// The most recently created round of the game, if any.
    async fn latest_for_game(&self, game_id: GameId) -> EngineResult<Option<Round>>;
}

/// Append-only turn log kept alongside the round snapshots.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Append a newly opened turn to the round's log.
    async fn append(&self, round_id: RoundId, turn: &Turn) -> EngineResult<()>;

    /// Record the settled form of a previously appended turn.
    async fn settle(&self, round_id: RoundId, turn: &Turn) -> EngineResult<()>;
}

/// Source of fresh decks in fair uniform random order.
#[async_trait]
pub trait CardSource: Send + Sync {
    /// A full 52-card deck, shuffled.
    async fn fresh_shuffled_deck(&self) -> EngineResult<Deck>;
}

/// Fire-and-forget signal that a player is on the move.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn on_player_to_act(&self, player: &Player, game_id: GameId);
}

/// Fire-and-forget hook invoked with every shown hand at showdown.
#[async_trait]
pub trait AchievementSink: Send + Sync {
    async fn on_hand_showdown(&self, game_id: GameId, hands: &HashMap<PlayerId, Vec<Card>>);
}
