//! Pot division at showdown.
//!
//! Everything a player wagered stays in the pot, folds included. Payouts
//! depend on whether the best tier contains an all-in player: without one
//! the pot splits equally over the best tier (integer division, remainder
//! dropped); with one, each player's take is capped by what their own
//! stake can claim and the leftovers cascade down the weaker tiers.

use std::collections::HashMap;

use super::entities::{Action, Chips, PlayerId, Round, Stake};
use super::errors::{EngineError, EngineResult};

/// Total wagered per player over the whole round, and whether the player
/// went all-in. Built for every player at the table, folded or not.
#[must_use]
pub fn build_stakes(round: &Round, player_ids: &[PlayerId]) -> Vec<Stake> {
    player_ids
        .iter()
        .map(|&player_id| {
            let mut total_wagered = 0;
            let mut went_all_in = false;
            for turn in round.turns.iter().filter(|t| t.player_id == player_id) {
                total_wagered += turn.wagered;
                if turn.action == Action::AllIn {
                    went_all_in = true;
                }
            }
            Stake {
                player_id,
                total_wagered,
                went_all_in,
            }
        })
        .collect()
}

/// Pay the pot out over the ranked winner tiers. The first tier must be
/// non-empty. Players beyond the point where the pot runs dry get no
/// entry at all; a capped winner inside the walk can get an explicit 0.
pub fn divide_pot(
    groups: &[Vec<PlayerId>],
    stakes: &[Stake],
) -> EngineResult<HashMap<PlayerId, Chips>> {
    let first_place = match groups.first() {
        Some(group) if !group.is_empty() => group,
        _ => return Err(EngineError::InvalidWinner),
    };

    let total_pot: Chips = stakes.iter().map(|s| s.total_wagered).sum();
    let per_winner = total_pot / first_place.len() as Chips;

    let winner_went_all_in = first_place
        .iter()
        .any(|&id| stake_of(stakes, id).is_some_and(|s| s.went_all_in));
    if !winner_went_all_in {
        return Ok(equal_shares(first_place, per_winner));
    }

    let smallest_claim = first_place
        .iter()
        .filter_map(|&id| stake_of(stakes, id))
        .map(|own| claimable(stakes, own))
        .min()
        .unwrap_or(Chips::MAX);
    if smallest_claim >= per_winner {
        return Ok(equal_shares(first_place, per_winner));
    }

    // Cascade: split what remains over each tier in order, capping each
    // player at their claimable amount.
    let mut payouts = HashMap::new();
    let mut remaining = total_pot;
    for group in groups {
        if remaining == 0 {
            break;
        }
        if group.is_empty() {
            continue;
        }
        let per_player = remaining / group.len() as Chips;
        for &player_id in group {
            if let Some(own) = stake_of(stakes, player_id) {
                let amount = claimable(stakes, own).min(per_player);
                payouts.insert(player_id, amount);
                remaining -= amount;
            }
        }
    }
    Ok(payouts)
}

fn equal_shares(winners: &[PlayerId], share: Chips) -> HashMap<PlayerId, Chips> {
    winners.iter().map(|&id| (id, share)).collect()
}

fn stake_of(stakes: &[Stake], player_id: PlayerId) -> Option<&Stake> {
    stakes.iter().find(|s| s.player_id == player_id)
}

/// Most a stake can claim from the pot: from every stake in the round, at
/// most the player's own total.
fn claimable(stakes: &[Stake], own: &Stake) -> Chips {
    stakes
        .iter()
        .map(|s| s.total_wagered.min(own.total_wagered))
        .sum()
}
