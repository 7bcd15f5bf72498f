//! Core poker round logic.
//!
//! This module provides the data model and the pure rules of a Texas
//! Hold'em round:
//!
//! - Cards, decks, turns, players and rounds ([`entities`])
//! - Seven-card hand evaluation and ranking ([`eval`])
//! - Phase transitions and turn order ([`state_machine`])
//! - Pot division with all-in claim caps ([`pot`])
//!
//! Everything here is pure and synchronous; persistence and orchestration
//! live in the [`crate::store`] and [`crate::engine`] modules.

pub mod config;
pub mod entities;
pub mod errors;
pub mod eval;
pub mod pot;
pub mod state_machine;

pub use config::GameConfig;
pub use entities::{
    ACE, Action, Card, Chips, Deck, GameId, HandRank, JACK, KING, MAX_PLAYERS, Phase, Player,
    PlayerId, QUEEN, Rank, Round, RoundId, Stake, Suit, Turn, TurnId, Username,
};
pub use errors::{EngineError, EngineResult};
pub use state_machine::Transition;
