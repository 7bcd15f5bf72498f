//! Round orchestration: actions in, transitions and payouts out.
//!
//! [`RoundEngine`] composes the pure game logic with the collaborator
//! stores. It loads a round snapshot, settles the submitted action, asks
//! the state machine what follows, persists the result and fires the
//! notification and achievement sinks. Per-round mutual exclusion comes
//! from [`RoundLocks`]; concurrent games never contend.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::game::config::GameConfig;
use crate::game::entities::{
    Action, Card, Chips, GameId, Player, PlayerId, Round, RoundId, Turn, TurnId,
};
use crate::game::errors::{EngineError, EngineResult};
use crate::game::state_machine::{self, Transition};
use crate::game::{eval, pot};
use crate::store::{
    AchievementSink, CardSource, NotificationSink, PlayerStore, RoundStore, TurnStore,
};

pub mod locks;

pub use locks::RoundLocks;

/// A player's decision for their open turn.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionRequest {
    Check,
    Call { amount: Chips },
    Raise { amount: Chips },
    Fold,
    AllIn,
}

/// What an applied action did to the round.
#[derive(Clone, Debug)]
pub struct ActionOutcome {
    /// Round snapshot after the action and its transition.
    pub round: Round,
    /// The transition the state machine chose.
    pub transition: Transition,
    /// Showdown payouts, present when the action finished the round.
    pub payouts: Option<HashMap<PlayerId, Chips>>,
}

/// Orchestrates rounds over the collaborator stores.
pub struct RoundEngine {
    players: Arc<dyn PlayerStore>,
    rounds: Arc<dyn RoundStore>,
    turns: Arc<dyn TurnStore>,
    cards: Arc<dyn CardSource>,
    notifications: Arc<dyn NotificationSink>,
    achievements: Arc<dyn AchievementSink>,
    config: GameConfig,
    locks: RoundLocks,
}

impl RoundEngine {
    /// Build an engine over the given collaborators. Fails when the config
    /// does not validate.
    pub fn new(
        players: Arc<dyn PlayerStore>,
        rounds: Arc<dyn RoundStore>,
        turns: Arc<dyn TurnStore>,
        cards: Arc<dyn CardSource>,
        notifications: Arc<dyn NotificationSink>,
        achievements: Arc<dyn AchievementSink>,
        config: GameConfig,
    ) -> EngineResult<Self> {
        config
            .validate()
            .map_err(|reason| EngineError::IllegalRoundState(format!("invalid config: {reason}")))?;
        Ok(Self {
            players,
            rounds,
            turns,
            cards,
            notifications,
            achievements,
            config,
            locks: RoundLocks::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start the game's first round: fresh shuffled deck, two hole cards
    /// per funded player, blinds at dealer+1 and dealer+2, first turn at
    /// dealer+3. Requires at least two funded players and no round still
    /// in progress.
    pub async fn start_round(&self, game_id: GameId) -> EngineResult<Round> {
        if let Some(latest) = self.rounds.latest_for_game(game_id).await? {
            if !latest.phase.is_finished() {
                return Err(EngineError::IllegalRoundState(format!(
                    "round {} is still in progress",
                    latest.id
                )));
            }
        }

        let mut players = self.funded_players(game_id).await?;
        log::info!("Starting game {} with {} players", game_id, players.len());
        self.open_round(game_id, 0, &mut players).await
    }

    /// Settle the player's decision for the round's open turn, then run
    /// the transition it causes. Finishing transitions run the showdown
    /// and return the payouts in the outcome.
    pub async fn apply_action(
        &self,
        game_id: GameId,
        round_id: RoundId,
        turn_id: TurnId,
        request: ActionRequest,
    ) -> EngineResult<ActionOutcome> {
        let _guard = self.locks.acquire(round_id).await;

        let mut round = self.rounds.load(round_id).await?;
        if round.game_id != game_id {
            return Err(EngineError::RoundNotFound(round_id));
        }
        let mut players = self.players.players_in_game(game_id).await?;

        self.settle_action(&mut round, &mut players, turn_id, request)
            .await?;

        let transition = state_machine::next_transition(&round, &players)?;
        log::debug!(
            "Round {} transition after turn {}: {:?}",
            round.id,
            turn_id,
            transition
        );

        match &transition {
            Transition::Finish => state_machine::finish(&mut round),
            Transition::RunOut => state_machine::run_out(&mut round)?,
            Transition::Advance => {
                state_machine::advance_phase(&mut round, &players)?;
                self.record_open_turn(&round).await?;
            }
            Transition::NextTurn(player_id) => {
                state_machine::open_turn(&mut round, *player_id);
                self.record_open_turn(&round).await?;
            }
        }

        let payouts = if round.phase.is_finished() {
            Some(self.showdown(&round, &mut players).await?)
        } else {
            None
        };

        self.rounds.save(&round).await?;
        if round.phase.is_finished() {
            self.locks.forget(round_id).await;
        }
        self.notify_on_move(&round, &players).await;

        Ok(ActionOutcome {
            round,
            transition,
            payouts,
        })
    }

    /// Evaluate every non-folded hand against the board, divide the pot
    /// and pay the winners through the player store.
    pub async fn showdown(
        &self,
        round: &Round,
        players: &mut [Player],
    ) -> EngineResult<HashMap<PlayerId, Chips>> {
        let folded = round.players_folded();
        let mut hands: HashMap<PlayerId, Vec<Card>> = HashMap::new();
        for player in players.iter().filter(|p| !folded.contains(&p.id)) {
            let mut cards = player.hand.clone();
            cards.extend(round.community.iter().copied());
            hands.insert(player.id, cards);
        }
        self.achievements
            .on_hand_showdown(round.game_id, &hands)
            .await;

        let mut ranks = HashMap::new();
        for (player_id, cards) in &hands {
            if let Some(rank) = eval::evaluate(cards.clone()) {
                ranks.insert(*player_id, rank);
            }
        }
        let groups = eval::rank_groups(&ranks);
        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        let stakes = pot::build_stakes(round, &ids);
        let payouts = pot::divide_pot(&groups, &stakes)?;

        for (player_id, chips) in &payouts {
            if let Some(player) = players.iter_mut().find(|p| p.id == *player_id) {
                player.stack += *chips;
            }
            self.players
                .update_stack(*player_id, i64::from(*chips))
                .await?;
        }
        log::info!(
            "Round {} showdown paid {} players from the pot",
            round.id,
            payouts.len()
        );
        Ok(payouts)
    }

    /// Roll a finished round into the next one: remove broke players and
    /// close their seat gaps, advance the dealer one seat, then deal and
    /// blind afresh.
    pub async fn next_round(&self, game_id: GameId, round_id: RoundId) -> EngineResult<Round> {
        let finished = self.rounds.load(round_id).await?;
        if finished.game_id != game_id {
            return Err(EngineError::RoundNotFound(round_id));
        }
        if !finished.phase.is_finished() {
            return Err(EngineError::IllegalRoundState(format!(
                "round {round_id} has not finished"
            )));
        }

        let players = self.players.players_in_game(game_id).await?;
        let mut remaining = self.remove_broke_players(players).await?;
        if remaining.len() < 2 {
            return Err(EngineError::IllegalRoundState(
                "game cannot continue with fewer than two funded players".into(),
            ));
        }

        let dealer_idx = (finished.dealer_idx + 1) % remaining.len();
        self.open_round(game_id, dealer_idx, &mut remaining).await
    }

    /// Seconds left on the display timer for the turn. May go negative;
    /// the engine never folds a player automatically.
    #[must_use]
    pub fn time_remaining(&self, turn: &Turn) -> i64 {
        turn.seconds_remaining(self.config.turn_seconds)
    }

    async fn funded_players(&self, game_id: GameId) -> EngineResult<Vec<Player>> {
        let mut players = self.players.players_in_game(game_id).await?;
        players.retain(|p| p.stack > 0);
        if players.len() < 2 {
            return Err(EngineError::IllegalRoundState(
                "game cannot start with fewer than two funded players".into(),
            ));
        }
        Ok(players)
    }

    async fn open_round(
        &self,
        game_id: GameId,
        dealer_idx: usize,
        players: &mut [Player],
    ) -> EngineResult<Round> {
        let deck = self.cards.fresh_shuffled_deck().await?;
        let mut round = Round::new(game_id, dealer_idx, deck);

        self.deal_hands(&mut round, players).await?;
        self.post_blinds(&mut round, players).await?;

        let first = (dealer_idx + round.turns.len() + 1) % players.len();
        state_machine::open_turn(&mut round, players[first].id);

        for turn in &round.turns {
            self.turns.append(round.id, turn).await?;
        }
        self.rounds.save(&round).await?;
        self.notify_on_move(&round, players).await;

        log::info!(
            "Round {} opened for game {} with the dealer at seat {}",
            round.id,
            game_id,
            dealer_idx
        );
        Ok(round)
    }

    async fn deal_hands(&self, round: &mut Round, players: &mut [Player]) -> EngineResult<()> {
        for player in players.iter_mut() {
            let (Some(first), Some(second)) = (round.deck.deal(), round.deck.deal()) else {
                return Err(EngineError::IllegalRoundState(
                    "deck exhausted while dealing hands".into(),
                ));
            };
            player.hand = vec![first, second];
            self.players
                .save_hand(player.id, player.hand.clone())
                .await?;
        }
        Ok(())
    }

    async fn post_blinds(&self, round: &mut Round, players: &mut [Player]) -> EngineResult<()> {
        let count = players.len();
        let small = (round.dealer_idx + 1) % count;
        let big = (round.dealer_idx + 2) % count;
        self.post_blind(
            round,
            &mut players[small],
            Action::SmallBlind,
            self.config.small_blind,
        )
        .await?;
        self.post_blind(
            round,
            &mut players[big],
            Action::BigBlind,
            self.config.big_blind,
        )
        .await
    }

    async fn post_blind(
        &self,
        round: &mut Round,
        player: &mut Player,
        blind: Action,
        amount: Chips,
    ) -> EngineResult<()> {
        // A stack below the blind goes all in for whatever it has.
        let (action, wagered) = if player.stack < amount {
            (Action::AllIn, player.stack)
        } else {
            (blind, amount)
        };
        player.stack -= wagered;
        self.players
            .update_stack(player.id, -i64::from(wagered))
            .await?;
        round
            .turns
            .push(Turn::settled(player.id, action, wagered, round.phase));
        log::debug!("Player {} posted {} as {}", player.id, wagered, action);
        Ok(())
    }

    async fn settle_action(
        &self,
        round: &mut Round,
        players: &mut [Player],
        turn_id: TurnId,
        request: ActionRequest,
    ) -> EngineResult<()> {
        let turn = round
            .turns
            .iter()
            .find(|t| t.id == turn_id)
            .ok_or(EngineError::TurnNotFound(turn_id))?;
        if turn.action.is_settled() {
            return Err(EngineError::IllegalRoundState(format!(
                "turn {turn_id} is already settled"
            )));
        }
        let actor_id = turn.player_id;

        let player = players
            .iter_mut()
            .find(|p| p.id == actor_id)
            .ok_or_else(|| {
                EngineError::IllegalRoundState("player on the move is not seated".into())
            })?;

        let (action, wagered) = match request {
            ActionRequest::Check => (Action::Check, 0),
            ActionRequest::Fold => (Action::Fold, 0),
            ActionRequest::Call { amount } => (Action::Call, amount),
            ActionRequest::Raise { amount } => (Action::Raise, amount),
            ActionRequest::AllIn => (Action::AllIn, player.stack),
        };
        if wagered > player.stack {
            return Err(EngineError::IllegalRoundState(format!(
                "wager {} exceeds stack {}",
                wagered, player.stack
            )));
        }

        round.settle_turn(turn_id, action, wagered)?;
        player.stack -= wagered;
        self.players
            .update_stack(actor_id, -i64::from(wagered))
            .await?;

        let settled = round
            .turns
            .iter()
            .find(|t| t.id == turn_id)
            .ok_or(EngineError::TurnNotFound(turn_id))?;
        self.turns.settle(round.id, settled).await?;

        log::info!(
            "Player {} played {} for {} in round {}",
            actor_id,
            action,
            wagered,
            round.id
        );
        Ok(())
    }

    async fn record_open_turn(&self, round: &Round) -> EngineResult<()> {
        if let Some(turn) = round.current_on_move() {
            self.turns.append(round.id, turn).await?;
        }
        Ok(())
    }

    async fn notify_on_move(&self, round: &Round, players: &[Player]) {
        if let Some(turn) = round.current_on_move() {
            if let Some(player) = players.iter().find(|p| p.id == turn.player_id) {
                self.notifications
                    .on_player_to_act(player, round.game_id)
                    .await;
            }
        }
    }

    async fn remove_broke_players(&self, mut players: Vec<Player>) -> EngineResult<Vec<Player>> {
        loop {
            let Some(pos) = players.iter().position(|p| p.stack == 0) else {
                break;
            };
            let broke = players.remove(pos);
            log::info!(
                "Removing broke player {} from seat {}",
                broke.id,
                broke.seat_idx
            );
            self.players.remove_player(broke.id).await?;
            for player in players.iter_mut() {
                if player.seat_idx > broke.seat_idx {
                    player.seat_idx -= 1;
                    self.players.update_seat(player.id, player.seat_idx).await?;
                }
            }
        }
        Ok(players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Phase, Username};
    use crate::store::{
        MemoryPlayers, MemoryRounds, MemoryTurns, RecordingAchievements, RecordingNotifications,
        ShuffledDeckSource,
    };
    use uuid::Uuid;

    struct Harness {
        engine: RoundEngine,
        players: Arc<MemoryPlayers>,
        rounds: Arc<MemoryRounds>,
        notifications: Arc<RecordingNotifications>,
        achievements: Arc<RecordingAchievements>,
        game_id: GameId,
        seated: Vec<Player>,
    }

    async fn harness(stacks: &[Chips]) -> Harness {
        let players = Arc::new(MemoryPlayers::new());
        let rounds = Arc::new(MemoryRounds::new());
        let turns = Arc::new(MemoryTurns::new());
        let notifications = Arc::new(RecordingNotifications::new());
        let achievements = Arc::new(RecordingAchievements::new());

        let game_id = Uuid::new_v4();
        let seated: Vec<Player> = stacks
            .iter()
            .enumerate()
            .map(|(seat, stack)| Player::new(Username::new(&format!("seat_{seat}")), *stack, seat))
            .collect();
        players.register_game(game_id, seated.clone()).await;

        let engine = RoundEngine::new(
            Arc::clone(&players) as Arc<dyn PlayerStore>,
            Arc::clone(&rounds) as Arc<dyn RoundStore>,
            turns as Arc<dyn TurnStore>,
            Arc::new(ShuffledDeckSource) as Arc<dyn CardSource>,
            Arc::clone(&notifications) as Arc<dyn NotificationSink>,
            Arc::clone(&achievements) as Arc<dyn AchievementSink>,
            GameConfig::default(),
        )
        .unwrap();

        Harness {
            engine,
            players,
            rounds,
            notifications,
            achievements,
            game_id,
            seated,
        }
    }

    // === start_round ===

    #[tokio::test]
    async fn test_start_round_deals_blinds_and_first_turn() {
        let h = harness(&[1_000, 1_000, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();

        assert_eq!(round.phase, Phase::PreFlop);
        assert_eq!(round.dealer_idx, 0);
        assert_eq!(round.turns.len(), 3);
        assert_eq!(round.turns[0].action, Action::SmallBlind);
        assert_eq!(round.turns[0].player_id, h.seated[1].id);
        assert_eq!(round.turns[0].wagered, 10);
        assert_eq!(round.turns[1].action, Action::BigBlind);
        assert_eq!(round.turns[1].player_id, h.seated[2].id);
        assert_eq!(round.turns[1].wagered, 20);
        assert_eq!(round.turns[2].action, Action::OnMove);
        assert_eq!(round.turns[2].player_id, h.seated[0].id);

        // Six hole cards gone from the deck, none on the board yet.
        assert_eq!(round.deck.len(), 46);
        assert!(round.community.is_empty());

        for seated in &h.seated {
            let player = h.players.player(seated.id).await.unwrap();
            assert_eq!(player.hand.len(), 2);
        }
        let small_blind = h.players.player(h.seated[1].id).await.unwrap();
        assert_eq!(small_blind.stack, 990);
        let big_blind = h.players.player(h.seated[2].id).await.unwrap();
        assert_eq!(big_blind.stack, 980);

        assert_eq!(
            h.notifications.notified().await,
            vec![(h.game_id, h.seated[0].id)]
        );
        assert!(h.rounds.load(round.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_start_round_requires_two_funded_players() {
        let h = harness(&[1_000, 0]).await;
        let err = h.engine.start_round(h.game_id).await.unwrap_err();
        assert!(matches!(err, EngineError::IllegalRoundState(_)));
    }

    #[tokio::test]
    async fn test_start_round_rejects_a_round_in_progress() {
        let h = harness(&[1_000, 1_000, 1_000]).await;
        h.engine.start_round(h.game_id).await.unwrap();
        let err = h.engine.start_round(h.game_id).await.unwrap_err();
        assert!(matches!(err, EngineError::IllegalRoundState(_)));
    }

    #[tokio::test]
    async fn test_short_stack_blind_is_forced_all_in() {
        let h = harness(&[1_000, 5, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();

        assert_eq!(round.turns[0].action, Action::AllIn);
        assert_eq!(round.turns[0].wagered, 5);
        let shover = h.players.player(h.seated[1].id).await.unwrap();
        assert_eq!(shover.stack, 0);
    }

    // === apply_action ===

    #[tokio::test]
    async fn test_apply_action_rejects_unknown_turn() {
        let h = harness(&[1_000, 1_000, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();
        let err = h
            .engine
            .apply_action(h.game_id, round.id, Uuid::new_v4(), ActionRequest::Check)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TurnNotFound(_)));
    }

    #[tokio::test]
    async fn test_apply_action_rejects_settled_turn() {
        let h = harness(&[1_000, 1_000, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();
        let blind_turn = round.turns[0].id;
        let err = h
            .engine
            .apply_action(h.game_id, round.id, blind_turn, ActionRequest::Check)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::IllegalRoundState(_)));
    }

    #[tokio::test]
    async fn test_apply_action_rejects_wager_beyond_stack() {
        let h = harness(&[1_000, 1_000, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();
        let open = round.turns[2].id;
        let err = h
            .engine
            .apply_action(
                h.game_id,
                round.id,
                open,
                ActionRequest::Raise { amount: 5_000 },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::IllegalRoundState(_)));
    }

    #[tokio::test]
    async fn test_wrong_game_is_round_not_found() {
        let h = harness(&[1_000, 1_000, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();
        let err = h
            .engine
            .apply_action(
                Uuid::new_v4(),
                round.id,
                round.turns[2].id,
                ActionRequest::Check,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RoundNotFound(_)));
    }

    #[tokio::test]
    async fn test_fold_out_pays_the_last_player_standing() {
        // Heads up: seat 1 posts the small blind and acts first.
        let h = harness(&[1_000, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();
        assert_eq!(round.turns[2].player_id, h.seated[1].id);

        let outcome = h
            .engine
            .apply_action(h.game_id, round.id, round.turns[2].id, ActionRequest::Fold)
            .await
            .unwrap();

        assert_eq!(outcome.transition, Transition::Finish);
        assert!(outcome.round.phase.is_finished());

        let payouts = outcome.payouts.unwrap();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[&h.seated[0].id], 30);

        // Big blind of 20 comes back plus the folded small blind of 10.
        let winner = h.players.player(h.seated[0].id).await.unwrap();
        assert_eq!(winner.stack, 1_010);
        let folder = h.players.player(h.seated[1].id).await.unwrap();
        assert_eq!(folder.stack, 990);

        assert_eq!(h.achievements.showdowns().await.len(), 1);
    }

    // === next_round ===

    #[tokio::test]
    async fn test_next_round_rejects_unfinished_round() {
        let h = harness(&[1_000, 1_000, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();
        let err = h.engine.next_round(h.game_id, round.id).await.unwrap_err();
        assert!(matches!(err, EngineError::IllegalRoundState(_)));
    }

    #[tokio::test]
    async fn test_next_round_drops_broke_players_and_rotates_dealer() {
        let h = harness(&[0, 1_000, 1_000]).await;
        let mut finished = Round::new(h.game_id, 0, crate::game::entities::Deck::new());
        finished.phase = Phase::Finished;
        h.rounds.save(&finished).await.unwrap();

        let round = h.engine.next_round(h.game_id, finished.id).await.unwrap();

        // Seat 0 was broke: the survivors shift down and the dealer moves on.
        assert_eq!(round.dealer_idx, 1);
        let players = h.players.players_in_game(h.game_id).await.unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].id, h.seated[1].id);
        assert_eq!(players[0].seat_idx, 0);
        assert_eq!(players[1].id, h.seated[2].id);
        assert_eq!(players[1].seat_idx, 1);

        // Dealer seat 1 means the small blind wraps to seat 0.
        assert_eq!(round.turns[0].action, Action::SmallBlind);
        assert_eq!(round.turns[0].player_id, h.seated[1].id);
    }

    // === time_remaining ===

    #[tokio::test]
    async fn test_time_remaining_starts_near_the_full_timer() {
        let h = harness(&[1_000, 1_000]).await;
        let round = h.engine.start_round(h.game_id).await.unwrap();
        let open = round.current_on_move().unwrap();
        let remaining = h.engine.time_remaining(open);
        assert!(remaining > 55 && remaining <= 60, "got {remaining}");
    }
}
