//! Hand Scoring Example
//!
//! Demonstrates evaluating hands, breaking ties, and ranking a table of
//! players into winner tiers.

use std::collections::HashMap;

use anyhow::Result;
use holdem_core::game::{
    entities::{Card, PlayerId, Suit},
    eval,
};
use uuid::Uuid;

fn main() -> Result<()> {
    println!("=== Hand Scoring Example ===\n");

    // Example 1: Evaluate a single 7-card hand
    println!("Example 1: Evaluating a 7-card hand");
    let hand = vec![
        Card(14, Suit::Heart),
        Card(13, Suit::Heart),
        Card(12, Suit::Heart),
        Card(11, Suit::Heart),
        Card(10, Suit::Heart),
        Card(9, Suit::Spade),
        Card(2, Suit::Club),
    ];

    let rank = eval::evaluate(hand.clone()).expect("seven cards always evaluate");
    println!("Hand: {hand:?}");
    println!("Score: {}", rank.score);
    println!("Combination: {:?}\n", rank.combination);

    // Example 2: Compare two hands in the same score bucket
    println!("Example 2: Comparing two pairs");
    let aces = eval::evaluate(vec![
        Card(14, Suit::Spade),
        Card(14, Suit::Heart),
        Card(10, Suit::Club),
        Card(9, Suit::Diamond),
        Card(2, Suit::Spade),
    ])
    .expect("hand evaluates");
    let kings = eval::evaluate(vec![
        Card(13, Suit::Spade),
        Card(13, Suit::Heart),
        Card(10, Suit::Club),
        Card(9, Suit::Diamond),
        Card(2, Suit::Spade),
    ])
    .expect("hand evaluates");

    println!("Pair of aces scores {}", aces.score);
    println!("Pair of kings scores {}", kings.score);
    println!(
        "Tiebreak says aces vs kings: {:?}\n",
        eval::compare_hands(&aces, &kings)
    );

    // Example 3: Rank a table into winner tiers, ties included
    println!("Example 3: Three players, two of them tied");
    let table = [
        ("alice", vec![
            Card(10, Suit::Heart),
            Card(10, Suit::Diamond),
            Card(5, Suit::Club),
            Card(3, Suit::Spade),
            Card(2, Suit::Heart),
        ]),
        ("bob", vec![
            Card(10, Suit::Spade),
            Card(10, Suit::Club),
            Card(5, Suit::Heart),
            Card(3, Suit::Diamond),
            Card(2, Suit::Club),
        ]),
        ("carol", vec![
            Card(9, Suit::Heart),
            Card(9, Suit::Diamond),
            Card(5, Suit::Club),
            Card(3, Suit::Spade),
            Card(2, Suit::Heart),
        ]),
    ];

    let mut names: HashMap<PlayerId, &str> = HashMap::new();
    let mut ranks = HashMap::new();
    for (name, cards) in &table {
        let player_id = Uuid::new_v4();
        names.insert(player_id, name);
        ranks.insert(
            player_id,
            eval::evaluate(cards.clone()).expect("hand evaluates"),
        );
    }

    for (tier, group) in eval::rank_groups(&ranks).iter().enumerate() {
        let members: Vec<&str> = group.iter().map(|id| names[id]).collect();
        println!("Tier {}: {members:?}", tier + 1);
    }

    // Example 4: The full score ladder
    println!("\nExample 4: One hand per score bucket");
    let ladder = [
        ("Royal Flush", vec![
            Card(14, Suit::Spade),
            Card(13, Suit::Spade),
            Card(12, Suit::Spade),
            Card(11, Suit::Spade),
            Card(10, Suit::Spade),
        ]),
        ("Straight Flush", vec![
            Card(9, Suit::Heart),
            Card(8, Suit::Heart),
            Card(7, Suit::Heart),
            Card(6, Suit::Heart),
            Card(5, Suit::Heart),
        ]),
        ("Four of a Kind", vec![
            Card(8, Suit::Spade),
            Card(8, Suit::Heart),
            Card(8, Suit::Diamond),
            Card(8, Suit::Club),
            Card(2, Suit::Spade),
        ]),
        ("Full House", vec![
            Card(10, Suit::Spade),
            Card(10, Suit::Heart),
            Card(10, Suit::Diamond),
            Card(6, Suit::Club),
            Card(6, Suit::Spade),
        ]),
        ("Flush", vec![
            Card(13, Suit::Club),
            Card(11, Suit::Club),
            Card(8, Suit::Club),
            Card(5, Suit::Club),
            Card(3, Suit::Club),
        ]),
        ("Straight", vec![
            Card(10, Suit::Spade),
            Card(9, Suit::Heart),
            Card(8, Suit::Diamond),
            Card(7, Suit::Club),
            Card(6, Suit::Spade),
        ]),
        ("Three of a Kind", vec![
            Card(7, Suit::Spade),
            Card(7, Suit::Heart),
            Card(7, Suit::Diamond),
            Card(12, Suit::Club),
            Card(3, Suit::Spade),
        ]),
        ("Two Pair", vec![
            Card(12, Suit::Spade),
            Card(12, Suit::Heart),
            Card(5, Suit::Diamond),
            Card(5, Suit::Club),
            Card(2, Suit::Spade),
        ]),
        ("One Pair", vec![
            Card(9, Suit::Spade),
            Card(9, Suit::Heart),
            Card(13, Suit::Diamond),
            Card(7, Suit::Club),
            Card(4, Suit::Spade),
        ]),
        ("High Card", vec![
            Card(14, Suit::Spade),
            Card(12, Suit::Heart),
            Card(10, Suit::Diamond),
            Card(7, Suit::Club),
            Card(3, Suit::Spade),
        ]),
    ];

    for (name, cards) in ladder {
        println!("{name}: {}", eval::hand_score(cards));
    }

    // Example 5: Evaluations serialize straight to JSON
    println!("\nExample 5: A hand rank as JSON");
    println!("{}", serde_json::to_string_pretty(&rank)?);

    println!("\n=== End of Hand Scoring Example ===");
    Ok(())
}
