//! Core entities of a Texas Hold'em round.
//!
//! Everything here is a plain value: rounds are explicit snapshots that the
//! state machine and pot logic transform, never lazily-loaded graphs. The
//! union of a round's deck, its community cards, and the players' hole cards
//! is always the full 52-card set with no duplicates.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use super::errors::{EngineError, EngineResult};

/// Chip amounts are whole currency units.
pub type Chips = u32;

pub type GameId = Uuid;
pub type RoundId = Uuid;
pub type TurnId = Uuid;
pub type PlayerId = Uuid;

/// Seats at a table are capped so that one deck always covers two hole
/// cards per player plus five community cards.
pub const MAX_PLAYERS: usize = 6;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Club, Self::Diamond, Self::Heart, Self::Spade];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card ranks run 2..=14; jack through ace get named constants.
pub type Rank = u8;

pub const JACK: Rank = 11;
pub const QUEEN: Rank = 12;
pub const KING: Rank = 13;
pub const ACE: Rank = 14;

/// A card is a tuple of rank (2u8..=14u8) and suit. Two cards are equal
/// exactly when both fields match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Rank, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rank = match self.0 {
            JACK => "J".to_string(),
            QUEEN => "Q".to_string(),
            KING => "K".to_string(),
            ACE => "A".to_string(),
            r => r.to_string(),
        };
        let repr = format!("{rank}{}", self.1);
        write!(f, "{repr:>3}")
    }
}

/// An ordered deck consumed from the front as cards are dealt. Built once
/// per round with all 52 cards and shuffled exactly once; it only shrinks
/// afterwards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    #[must_use]
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::ALL {
            for rank in 2..=ACE {
                cards.push(Card(rank, suit));
            }
        }
        Self { cards }
    }

    /// Fisher–Yates via `rand`; the one fair permutation a round gets.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    pub fn deal(&mut self) -> Option<Card> {
        if self.cards.is_empty() {
            None
        } else {
            Some(self.cards.remove(0))
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

/// Betting stages of a round. `Finished` is terminal: a round reaches it
/// exactly once and is never reopened.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    PreFlop,
    Flop,
    Turn,
    River,
    Finished,
}

impl Phase {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::PreFlop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River | Self::Finished => Self::Finished,
        }
    }

    /// Community cards dealt when this phase opens: 3 on the flop, 1 each
    /// on the turn and river.
    #[must_use]
    pub const fn cards_dealt(self) -> usize {
        match self {
            Self::Flop => 3,
            Self::Turn | Self::River => 1,
            Self::PreFlop | Self::Finished => 0,
        }
    }

    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// What a turn records. `OnMove` marks the single open turn awaiting a
/// decision; everything else is a settled action.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    OnMove,
    Check,
    Call,
    Raise,
    Fold,
    AllIn,
    SmallBlind,
    BigBlind,
}

impl Action {
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::OnMove)
    }

    #[must_use]
    pub const fn is_blind(self) -> bool {
        matches!(self, Self::SmallBlind | Self::BigBlind)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::OnMove => "on move",
            Self::Check => "check",
            Self::Call => "call",
            Self::Raise => "raise",
            Self::Fold => "fold",
            Self::AllIn => "all-in",
            Self::SmallBlind => "small blind",
            Self::BigBlind => "big blind",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let name: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        Self(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One recorded decision (or blind post) inside a round. Settled turns are
/// append-only: they never change after the action lands.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Turn {
    pub id: TurnId,
    pub player_id: PlayerId,
    pub action: Action,
    pub wagered: Chips,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Open a turn awaiting the player's decision.
    #[must_use]
    pub fn open(player_id: PlayerId, phase: Phase) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            action: Action::OnMove,
            wagered: 0,
            phase,
            created_at: Utc::now(),
        }
    }

    /// A turn that is already decided when it is created (blind posts and
    /// forced all-ins).
    #[must_use]
    pub fn settled(player_id: PlayerId, action: Action, wagered: Chips, phase: Phase) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            action,
            wagered,
            phase,
            created_at: Utc::now(),
        }
    }

    /// Seconds left on the display timer for this turn; negative once the
    /// timer has lapsed. Nothing in the engine acts on expiry.
    #[must_use]
    pub fn seconds_remaining(&self, timer_seconds: i64) -> i64 {
        let expires = self.created_at + Duration::seconds(timer_seconds);
        (expires - Utc::now()).num_seconds()
    }
}

/// A player as the engine sees one: hydrated, no backing references.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: Username,
    pub stack: Chips,
    pub seat_idx: usize,
    pub hand: Vec<Card>,
}

impl Player {
    #[must_use]
    pub fn new(username: Username, stack: Chips, seat_idx: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            stack,
            seat_idx,
            hand: Vec::with_capacity(2),
        }
    }
}

/// What one player has put into the round so far.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Stake {
    pub player_id: PlayerId,
    pub total_wagered: Chips,
    pub went_all_in: bool,
}

/// Evaluator output: the category score bucket (900 royal flush down to
/// 0 high card), the cards forming the combination, and the leftover
/// kickers. Both card lists keep descending rank order.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandRank {
    pub score: u32,
    pub combination: Vec<Card>,
    pub kickers: Vec<Card>,
}

/// A full betting round: phase, dealer anchor, board, remaining deck, and
/// the ordered turn history.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Round {
    pub id: RoundId,
    pub game_id: GameId,
    pub phase: Phase,
    pub dealer_idx: usize,
    pub community: Vec<Card>,
    pub deck: Deck,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
}

impl Round {
    #[must_use]
    pub fn new(game_id: GameId, dealer_idx: usize, deck: Deck) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_id,
            phase: Phase::PreFlop,
            dealer_idx,
            community: Vec::with_capacity(5),
            deck,
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The single open turn, if the round is waiting on a decision.
    #[must_use]
    pub fn current_on_move(&self) -> Option<&Turn> {
        self.turns.iter().find(|t| !t.action.is_settled())
    }

    pub fn turns_in_phase(&self, phase: Phase) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(move |t| t.phase == phase)
    }

    /// Players with a fold on record, any phase.
    #[must_use]
    pub fn players_folded(&self) -> HashSet<PlayerId> {
        self.turns
            .iter()
            .filter(|t| t.action == Action::Fold)
            .map(|t| t.player_id)
            .collect()
    }

    /// Players with an all-in on record, any phase. A player goes all-in at
    /// most once per round, so the list is already duplicate-free.
    #[must_use]
    pub fn players_all_in(&self) -> Vec<PlayerId> {
        self.turns
            .iter()
            .filter(|t| t.action == Action::AllIn)
            .map(|t| t.player_id)
            .collect()
    }

    /// Settle the current open turn with the player's decision. Settling
    /// anything other than the one open ON_MOVE turn is rejected.
    pub fn settle_turn(&mut self, turn_id: TurnId, action: Action, wagered: Chips) -> EngineResult<()> {
        if !action.is_settled() {
            return Err(EngineError::IllegalRoundState(
                "a turn cannot be settled back to on-move".into(),
            ));
        }
        let open_id = match self.current_on_move() {
            Some(open) => open.id,
            None => {
                return if self.turns.iter().any(|t| t.id == turn_id) {
                    Err(EngineError::IllegalRoundState(
                        "turn is already settled".into(),
                    ))
                } else {
                    Err(EngineError::TurnNotFound(turn_id))
                };
            }
        };
        if open_id != turn_id {
            return if self.turns.iter().any(|t| t.id == turn_id) {
                Err(EngineError::IllegalRoundState(
                    "turn is not the current on-move turn".into(),
                ))
            } else {
                Err(EngineError::TurnNotFound(turn_id))
            };
        }
        for turn in &mut self.turns {
            if turn.id == turn_id {
                turn.action = action;
                turn.wagered = wagered;
                break;
            }
        }
        Ok(())
    }

    /// Move one community card from the front of the deck to the board.
    pub fn deal_community_card(&mut self) -> EngineResult<()> {
        match self.deck.deal() {
            Some(card) => {
                self.community.push(card);
                Ok(())
            }
            None => Err(EngineError::IllegalRoundState(
                "deck is empty, cannot add community card".into(),
            )),
        }
    }
}
