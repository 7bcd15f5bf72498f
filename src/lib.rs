//! # Holdem Core
//!
//! A Texas Hold'em round engine: hand evaluation, betting-round state
//! transitions, pot division with all-in claim caps, and an async
//! orchestrator over pluggable stores.
//!
//! ## Architecture
//!
//! A round moves through five phases (PRE_FLOP, FLOP, TURN, RIVER,
//! FINISHED). After every settled action the state machine decides one of
//! four transitions:
//!
//! - **Finish**: only one contender remains, the round ends where it stands
//! - **RunOut**: betting can no longer change anything, deal the rest of
//!   the board and finish
//! - **Advance**: the phase is complete, deal its cards and open the first
//!   turn of the next phase
//! - **NextTurn**: betting continues with the next player clockwise
//!
//! Hand strength uses an ordered predicate table scoring 900 (royal flush)
//! down to 0 (high card); the pot divides among ranked winner groups with
//! each all-in winner capped at what their own stake can claim.
//!
//! ## Core Modules
//!
//! - [`game`]: entities, evaluator, state machine and pot division
//! - [`store`]: async collaborator traits plus in-memory implementations
//! - [`engine`]: the orchestrator applying actions and running showdowns
//!
//! ## Example
//!
//! ```
//! use holdem_core::game::{Deck, eval};
//!
//! let mut deck = Deck::new();
//! deck.shuffle();
//! let hand: Vec<_> = (0..7).filter_map(|_| deck.deal()).collect();
//! let rank = eval::evaluate(hand).unwrap();
//! assert!(rank.score <= 900);
//! ```

/// Core game logic, entities, and round state machine.
pub mod game;
pub use game::{
    Action, Card, Chips, Deck, EngineError, EngineResult, GameConfig, HandRank, Phase, Player,
    PlayerId, Round, Transition, Turn, Username,
};

/// Collaborator store traits and in-memory implementations.
pub mod store;

/// Round orchestration over the stores.
pub mod engine;
pub use engine::{ActionOutcome, ActionRequest, RoundEngine, RoundLocks};
