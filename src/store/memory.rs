//! In-memory store implementations.
//!
//! Backed by `tokio::sync::Mutex` maps so they can be shared across tasks
//! without blocking the runtime. Tests and demos seed games through
//! [`MemoryPlayers::register_game`] and inspect side effects through the
//! recording sinks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::game::entities::{Card, Chips, Deck, GameId, Player, PlayerId, Round, RoundId, Turn};
use crate::game::errors::{EngineError, EngineResult};

use super::{AchievementSink, CardSource, NotificationSink, PlayerStore, RoundStore, TurnStore};

/// Seated players per game.
#[derive(Clone, Debug)]
pub struct MemoryPlayers {
    games: Arc<Mutex<HashMap<GameId, Vec<Player>>>>,
}

impl Default for MemoryPlayers {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlayers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            games: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Seat the players at a game, replacing any previous seating.
    pub async fn register_game(&self, game_id: GameId, players: Vec<Player>) {
        self.games.lock().await.insert(game_id, players);
    }

    /// Current snapshot of one player, wherever they are seated.
    pub async fn player(&self, player_id: PlayerId) -> Option<Player> {
        let games = self.games.lock().await;
        games
            .values()
            .flat_map(|players| players.iter())
            .find(|p| p.id == player_id)
            .cloned()
    }
}

#[async_trait]
impl PlayerStore for MemoryPlayers {
    async fn players_in_game(&self, game_id: GameId) -> EngineResult<Vec<Player>> {
        let games = self.games.lock().await;
        let mut players = games
            .get(&game_id)
            .cloned()
            .ok_or(EngineError::GameNotFound(game_id))?;
        players.sort_by_key(|p| p.seat_idx);
        Ok(players)
    }

    async fn update_stack(&self, player_id: PlayerId, delta: i64) -> EngineResult<()> {
        let mut games = self.games.lock().await;
        for players in games.values_mut() {
            if let Some(player) = players.iter_mut().find(|p| p.id == player_id) {
                let stack = (i64::from(player.stack) + delta).max(0);
                player.stack = Chips::try_from(stack).unwrap_or(Chips::MAX);
                return Ok(());
            }
        }
        Err(EngineError::Storage(format!("player {player_id} is not seated")))
    }

    async fn update_seat(&self, player_id: PlayerId, seat_idx: usize) -> EngineResult<()> {
        let mut games = self.games.lock().await;
        for players in games.values_mut() {
            if let Some(player) = players.iter_mut().find(|p| p.id == player_id) {
                player.seat_idx = seat_idx;
                return Ok(());
            }
        }
        Err(EngineError::Storage(format!("player {player_id} is not seated")))
    }

    async fn save_hand(&self, player_id: PlayerId, hand: Vec<Card>) -> EngineResult<()> {
        let mut games = self.games.lock().await;
        for players in games.values_mut() {
            if let Some(player) = players.iter_mut().find(|p| p.id == player_id) {
                player.hand = hand;
                return Ok(());
            }
        }
        Err(EngineError::Storage(format!("player {player_id} is not seated")))
    }

    async fn remove_player(&self, player_id: PlayerId) -> EngineResult<()> {
        let mut games = self.games.lock().await;
        for players in games.values_mut() {
            players.retain(|p| p.id != player_id);
        }
        Ok(())
    }
}

/// Round snapshots keyed by round id.
#[derive(Clone, Debug)]
pub struct MemoryRounds {
    rounds: Arc<Mutex<HashMap<RoundId, Round>>>,
}

impl Default for MemoryRounds {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRounds {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rounds: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl RoundStore for MemoryRounds {
    async fn load(&self, round_id: RoundId) -> EngineResult<Round> {
        let rounds = self.rounds.lock().await;
        rounds
            .get(&round_id)
            .cloned()
            .ok_or(EngineError::RoundNotFound(round_id))
    }

    async fn save(&self, round: &Round) -> EngineResult<()> {
        self.rounds.lock().await.insert(round.id, round.clone());
        Ok(())
    }

    async fn latest_for_game(&self, game_id: GameId) -> EngineResult<Option<Round>> {
        let rounds = self.rounds.lock().await;
        Ok(rounds
            .values()
            .filter(|r| r.game_id == game_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }
}

/// Append-only turn log per round.
#[derive(Clone, Debug)]
pub struct MemoryTurns {
    log: Arc<Mutex<HashMap<RoundId, Vec<Turn>>>>,
}

impl Default for MemoryTurns {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTurns {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Everything logged for the round, in append order.
    pub async fn turns(&self, round_id: RoundId) -> Vec<Turn> {
        self.log
            .lock()
            .await
            .get(&round_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TurnStore for MemoryTurns {
    async fn append(&self, round_id: RoundId, turn: &Turn) -> EngineResult<()> {
        self.log
            .lock()
            .await
            .entry(round_id)
            .or_default()
            .push(turn.clone());
        Ok(())
    }

    async fn settle(&self, round_id: RoundId, turn: &Turn) -> EngineResult<()> {
        let mut log = self.log.lock().await;
        let turns = log
            .get_mut(&round_id)
            .ok_or(EngineError::RoundNotFound(round_id))?;
        let logged = turns
            .iter_mut()
            .find(|t| t.id == turn.id)
            .ok_or(EngineError::TurnNotFound(turn.id))?;
        *logged = turn.clone();
        Ok(())
    }
}

/// Deals a freshly shuffled deck on every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShuffledDeckSource;

#[async_trait]
impl CardSource for ShuffledDeckSource {
    async fn fresh_shuffled_deck(&self) -> EngineResult<Deck> {
        let mut deck = Deck::new();
        deck.shuffle();
        Ok(deck)
    }
}

/// Records every on-move notification for assertions.
#[derive(Clone, Debug)]
pub struct RecordingNotifications {
    notified: Arc<Mutex<Vec<(GameId, PlayerId)>>>,
}

impl Default for RecordingNotifications {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingNotifications {
    #[must_use]
    pub fn new() -> Self {
        Self {
            notified: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Notifications captured so far, in order.
    pub async fn notified(&self) -> Vec<(GameId, PlayerId)> {
        self.notified.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifications {
    async fn on_player_to_act(&self, player: &Player, game_id: GameId) {
        self.notified.lock().await.push((game_id, player.id));
    }
}

/// Records every showdown hand map for assertions.
#[derive(Clone, Debug)]
pub struct RecordingAchievements {
    showdowns: Arc<Mutex<Vec<(GameId, HashMap<PlayerId, Vec<Card>>)>>>,
}

impl Default for RecordingAchievements {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingAchievements {
    #[must_use]
    pub fn new() -> Self {
        Self {
            showdowns: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Showdown hand maps captured so far, in order.
    pub async fn showdowns(&self) -> Vec<(GameId, HashMap<PlayerId, Vec<Card>>)> {
        self.showdowns.lock().await.clone()
    }
}

#[async_trait]
impl AchievementSink for RecordingAchievements {
    async fn on_hand_showdown(&self, game_id: GameId, hands: &HashMap<PlayerId, Vec<Card>>) {
        self.showdowns.lock().await.push((game_id, hands.clone()));
    }
}
