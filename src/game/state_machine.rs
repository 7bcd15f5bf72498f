//! Round phase transitions and turn order.
//!
//! The round moves strictly forward through pre-flop, flop, turn, river and
//! finished. After every settled action the engine asks for the next
//! transition: finish early when only one contender remains, run the board
//! out when betting can no longer change anything, advance the phase when
//! everyone has moved and matched the bet, or hand the action to the next
//! player otherwise.

use std::collections::{HashMap, HashSet};

use super::entities::{Action, Chips, Phase, Player, PlayerId, Round, Turn};
use super::errors::{EngineError, EngineResult};

/// What the round should do after a settled action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// The round is decided without a showdown run-out.
    Finish,
    /// Betting is over but cards remain: deal the rest of the board, then
    /// finish.
    RunOut,
    /// The phase is complete: move on, deal its cards, open the first turn.
    Advance,
    /// Betting continues: open a turn for this player.
    NextTurn(PlayerId),
}

/// Players still contending: everyone at the table minus those who folded,
/// and minus all-in players unless `include_all_in`. Seat order of the
/// input is preserved.
#[must_use]
pub fn players_left(round: &Round, players: &[Player], include_all_in: bool) -> Vec<PlayerId> {
    let folded = round.players_folded();
    let all_in: HashSet<PlayerId> = round.players_all_in().into_iter().collect();
    players
        .iter()
        .map(|p| p.id)
        .filter(|id| !folded.contains(id))
        .filter(|id| include_all_in || !all_in.contains(id))
        .collect()
}

/// Decide what follows the action that just settled. `players` must be the
/// game's seated players in seat order.
pub fn next_transition(round: &Round, players: &[Player]) -> EngineResult<Transition> {
    let left = players_left(round, players, false);
    let all_in = round.players_all_in();

    if (left.len() == 1 && all_in.is_empty()) || (left.is_empty() && all_in.len() == 1) {
        return Ok(Transition::Finish);
    }

    let all_moved = all_players_moved(round, players);
    if all_moved && ((left.len() == 1 && !all_in.is_empty()) || (left.is_empty() && all_in.len() > 1)) {
        return Ok(Transition::RunOut);
    }
    if all_moved && bets_matched(round, players) {
        return Ok(Transition::Advance);
    }
    next_to_act(round, players).map(Transition::NextTurn)
}

/// Whether every player who can still act has had their say this phase.
///
/// A raise or a full-size all-in reopens the action: turns before the last
/// such aggressor stop counting, except all-ins, which stand regardless.
#[must_use]
pub fn all_players_moved(round: &Round, players: &[Player]) -> bool {
    let mut move_counts: HashMap<PlayerId, u64> = players_left(round, players, true)
        .into_iter()
        .map(|id| (id, 0))
        .collect();

    // Players done in an earlier phase have no say in this one.
    for turn in &round.turns {
        if turn.phase != round.phase && matches!(turn.action, Action::AllIn | Action::Fold) {
            move_counts.remove(&turn.player_id);
        }
    }

    let mut phase_turns: Vec<&Turn> = round
        .turns
        .iter()
        .filter(|t| {
            t.phase == round.phase
                && !matches!(t.action, Action::Fold | Action::SmallBlind | Action::BigBlind)
        })
        .collect();

    let max_wagered = phase_turns.iter().map(|t| t.wagered).max().unwrap_or(0);
    let last_aggressor = phase_turns
        .iter()
        .filter(|t| {
            t.action == Action::Raise || (t.action == Action::AllIn && t.wagered >= max_wagered)
        })
        .next_back()
        .map(|t| t.id);

    if let Some(aggressor_id) = last_aggressor {
        let mut trimmed = Vec::with_capacity(phase_turns.len());
        let mut before_aggressor = true;
        for turn in phase_turns {
            if turn.id == aggressor_id {
                before_aggressor = false;
            } else if before_aggressor && turn.action != Action::AllIn {
                continue;
            }
            trimmed.push(turn);
        }
        phase_turns = trimmed;
    }

    for turn in phase_turns {
        *move_counts.entry(turn.player_id).or_insert(0) += 1;
    }

    let mut counts = move_counts.values();
    match counts.next() {
        Some(first) => counts.all(|count| count == first),
        None => true,
    }
}

/// Whether every contender has wagered at least this phase's highest
/// single wager. All-ins this phase are exempt; earlier phases never
/// count.
#[must_use]
pub fn bets_matched(round: &Round, players: &[Player]) -> bool {
    let mut totals: HashMap<PlayerId, Chips> = HashMap::new();
    let mut all_in_this_phase: HashSet<PlayerId> = HashSet::new();
    let mut max_single_wager: Chips = 0;

    for turn in round.turns_in_phase(round.phase) {
        *totals.entry(turn.player_id).or_insert(0) += turn.wagered;
        if turn.action == Action::AllIn {
            all_in_this_phase.insert(turn.player_id);
        }
        max_single_wager = max_single_wager.max(turn.wagered);
    }

    for player_id in players_left(round, players, false) {
        let total = totals.get(&player_id).copied().unwrap_or(0);
        if !all_in_this_phase.contains(&player_id) && total < max_single_wager {
            return false;
        }
    }
    true
}

/// The player to open the next turn for. Mid-phase the action continues
/// clockwise from the last actor, skipping players done for the phase; at
/// a phase start it goes to the first contender after the dealer.
pub fn next_to_act(round: &Round, players: &[Player]) -> EngineResult<PlayerId> {
    let paused: Vec<PlayerId> = round
        .turns
        .iter()
        .filter(|t| t.phase == round.phase && matches!(t.action, Action::Fold | Action::AllIn))
        .map(|t| t.player_id)
        .collect();

    // Contenders plus the players parked this phase, in seat order, so the
    // clockwise walk can step over the parked ones.
    let mut candidates = players_left(round, players, false);
    candidates.extend(paused.iter().copied());
    let seat_of: HashMap<PlayerId, usize> = players.iter().map(|p| (p.id, p.seat_idx)).collect();
    candidates.sort_by_key(|id| seat_of.get(id).copied().unwrap_or(usize::MAX));

    if candidates.is_empty() {
        return Err(EngineError::IllegalRoundState(
            "no player is able to act".into(),
        ));
    }

    let last_actor = round.turns_in_phase(round.phase).last().map(|t| t.player_id);
    match last_actor {
        Some(last) => {
            let start = candidates
                .iter()
                .position(|&id| id == last)
                .map_or(0, |i| (i + 1) % candidates.len());
            let paused: HashSet<PlayerId> = paused.into_iter().collect();
            for offset in 0..candidates.len() {
                let candidate = candidates[(start + offset) % candidates.len()];
                if !paused.contains(&candidate) {
                    return Ok(candidate);
                }
            }
            Err(EngineError::IllegalRoundState(
                "no player is able to act".into(),
            ))
        }
        None => {
            let mut seats: Vec<&Player> = players.iter().collect();
            seats.sort_by_key(|p| p.seat_idx);
            for offset in 0..seats.len() {
                let candidate = seats[(round.dealer_idx + 1 + offset) % seats.len()].id;
                if candidates.contains(&candidate) {
                    return Ok(candidate);
                }
            }
            Err(EngineError::IllegalRoundState(
                "no player is able to act".into(),
            ))
        }
    }
}

/// Append an open turn for the player in the round's current phase.
pub fn open_turn(round: &mut Round, player_id: PlayerId) {
    round.turns.push(Turn::open(player_id, round.phase));
}

/// Close the round where it stands; the board stays as dealt.
pub fn finish(round: &mut Round) {
    round.phase = Phase::Finished;
}

/// Move to the next phase, deal its community cards, and open the first
/// turn of the phase. Advancing past the river finishes the round and
/// opens no turn.
pub fn advance_phase(round: &mut Round, players: &[Player]) -> EngineResult<()> {
    round.phase = round.phase.next();
    for _ in 0..round.phase.cards_dealt() {
        round.deal_community_card()?;
    }
    if !round.phase.is_finished() {
        let next = next_to_act(round, players)?;
        open_turn(round, next);
    }
    Ok(())
}

/// Deal the rest of the board with no further betting, then finish.
pub fn run_out(round: &mut Round) -> EngineResult<()> {
    while !round.phase.is_finished() {
        round.phase = round.phase.next();
        for _ in 0..round.phase.cards_dealt() {
            round.deal_community_card()?;
        }
    }
    Ok(())
}
