/// Integration tests for round flow scenarios
///
/// These tests drive the engine end to end over the in-memory stores:
/// betting streets, showdowns, run-outs, and chaining one round into
/// the next.
use std::sync::Arc;

use holdem_core::{
    engine::{ActionOutcome, ActionRequest, RoundEngine},
    game::{
        Action, Chips, EngineError, GameConfig, GameId, Phase, Player, Round, Transition, Username,
    },
    store::{
        AchievementSink, CardSource, MemoryPlayers, MemoryRounds, MemoryTurns, NotificationSink,
        PlayerStore, RecordingAchievements, RecordingNotifications, RoundStore, ShuffledDeckSource,
        TurnStore,
    },
};
use uuid::Uuid;

struct Harness {
    engine: RoundEngine,
    players: Arc<MemoryPlayers>,
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
        rounds as Arc<dyn RoundStore>,
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
        notifications,
        achievements,
        game_id,
        seated,
    }
}

/// Apply a request to whichever turn is currently open.
async fn act(h: &Harness, round: &Round, request: ActionRequest) -> ActionOutcome {
    let open = round.current_on_move().expect("a turn should be open");
    h.engine
        .apply_action(h.game_id, round.id, open.id, request)
        .await
        .expect("the action should settle")
}

#[tokio::test]
async fn test_round_of_checks_reaches_showdown_and_conserves_chips() {
    let h = harness(&[1_000, 1_000, 1_000]).await;
    let round = h.engine.start_round(h.game_id).await.unwrap();

    // Pre-flop: the seat after the big blind calls, the small blind
    // completes, and the big blind takes its option.
    let outcome = act(&h, &round, ActionRequest::Call { amount: 20 }).await;
    assert_eq!(outcome.transition, Transition::NextTurn(h.seated[1].id));
    let outcome = act(&h, &outcome.round, ActionRequest::Call { amount: 10 }).await;
    assert_eq!(outcome.transition, Transition::NextTurn(h.seated[2].id));
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    assert_eq!(outcome.transition, Transition::Advance);
    assert_eq!(outcome.round.phase, Phase::Flop);
    assert_eq!(outcome.round.community.len(), 3);
    assert_eq!(outcome.round.deck.len(), 43);

    // The flop opens on the first seat after the dealer.
    let open = outcome.round.current_on_move().unwrap();
    assert_eq!(open.player_id, h.seated[1].id);

    // Flop: three checks advance to the turn.
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    assert_eq!(outcome.round.phase, Phase::Turn);
    assert_eq!(outcome.round.community.len(), 4);

    // Turn: three checks advance to the river.
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    assert_eq!(outcome.round.phase, Phase::River);
    assert_eq!(outcome.round.community.len(), 5);

    // River: the last check finishes the round with no further turn.
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    assert_eq!(outcome.transition, Transition::Advance);
    assert!(outcome.round.phase.is_finished());
    assert!(outcome.round.current_on_move().is_none());

    // Sixty chips went in, sixty come back out regardless of who won.
    let payouts = outcome.payouts.unwrap();
    let awarded: Chips = payouts.values().sum();
    assert_eq!(awarded, 60, "the pot holds three calls of 20");
    let players = h.players.players_in_game(h.game_id).await.unwrap();
    let total: Chips = players.iter().map(|p| p.stack).sum();
    assert_eq!(total, 3_000, "chips stay conserved across the table");

    // One notification per opened turn, one showdown recorded.
    assert_eq!(h.notifications.notified().await.len(), 12);
    assert_eq!(h.achievements.showdowns().await.len(), 1);
}

#[tokio::test]
async fn test_raise_and_folds_finish_on_the_flop() {
    let h = harness(&[1_000, 1_000, 1_000]).await;
    let round = h.engine.start_round(h.game_id).await.unwrap();

    // Limp through pre-flop.
    let outcome = act(&h, &round, ActionRequest::Call { amount: 20 }).await;
    let outcome = act(&h, &outcome.round, ActionRequest::Call { amount: 10 }).await;
    let outcome = act(&h, &outcome.round, ActionRequest::Check).await;
    assert_eq!(outcome.round.phase, Phase::Flop);

    // A raise folds the table out.
    let outcome = act(&h, &outcome.round, ActionRequest::Raise { amount: 50 }).await;
    assert_eq!(outcome.transition, Transition::NextTurn(h.seated[2].id));
    let outcome = act(&h, &outcome.round, ActionRequest::Fold).await;
    assert_eq!(outcome.transition, Transition::NextTurn(h.seated[0].id));
    let outcome = act(&h, &outcome.round, ActionRequest::Fold).await;

    assert_eq!(outcome.transition, Transition::Finish);
    assert!(outcome.round.phase.is_finished());
    assert_eq!(outcome.round.community.len(), 3, "finishing keeps the board as dealt");

    // The raiser collects every wagered chip, folds included.
    let payouts = outcome.payouts.unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[&h.seated[1].id], 110);
    let raiser = h.players.player(h.seated[1].id).await.unwrap();
    assert_eq!(raiser.stack, 1_040);
    let caller = h.players.player(h.seated[0].id).await.unwrap();
    assert_eq!(caller.stack, 980);
    let big_blind = h.players.player(h.seated[2].id).await.unwrap();
    assert_eq!(big_blind.stack, 980);
}

#[tokio::test]
async fn test_all_in_players_run_the_board_out() {
    let h = harness(&[1_000, 1_000, 60]).await;
    let round = h.engine.start_round(h.game_id).await.unwrap();

    // Seat 0 shoves, seat 1 gets out of the way, the short stack calls
    // with everything it has left.
    let outcome = act(&h, &round, ActionRequest::AllIn).await;
    assert_eq!(outcome.transition, Transition::NextTurn(h.seated[1].id));
    let outcome = act(&h, &outcome.round, ActionRequest::Fold).await;
    assert_eq!(outcome.transition, Transition::NextTurn(h.seated[2].id));
    let outcome = act(&h, &outcome.round, ActionRequest::AllIn).await;

    // Nobody can act, so the board runs out to the river.
    assert_eq!(outcome.transition, Transition::RunOut);
    assert!(outcome.round.phase.is_finished());
    assert_eq!(outcome.round.community.len(), 5);
    assert_eq!(outcome.round.deck.len(), 41);
    assert!(outcome.round.current_on_move().is_none());

    // The folder keeps its remaining stack and its blind stays in the pot.
    let folder = h.players.player(h.seated[1].id).await.unwrap();
    assert_eq!(folder.stack, 990);

    // Whoever won, each all-in stack now equals exactly its payout.
    let payouts = outcome.payouts.unwrap();
    assert!(!payouts.contains_key(&h.seated[1].id), "folded hands win nothing");
    let shover = h.players.player(h.seated[0].id).await.unwrap();
    assert_eq!(shover.stack, payouts.get(&h.seated[0].id).copied().unwrap_or(0));
    let short = h.players.player(h.seated[2].id).await.unwrap();
    assert_eq!(short.stack, payouts.get(&h.seated[2].id).copied().unwrap_or(0));

    // The showdown saw the two live hands with seven cards each.
    let showdowns = h.achievements.showdowns().await;
    assert_eq!(showdowns.len(), 1);
    let hands = &showdowns[0].1;
    assert_eq!(hands.len(), 2);
    assert!(hands.contains_key(&h.seated[0].id));
    assert!(hands.contains_key(&h.seated[2].id));
    assert!(hands.values().all(|cards| cards.len() == 7));
}

#[tokio::test]
async fn test_next_round_rotates_and_replays_blinds() {
    let h = harness(&[1_000, 1_000]).await;
    let round = h.engine.start_round(h.game_id).await.unwrap();

    // Heads up the small blind acts first; folding hands the pot over.
    let outcome = act(&h, &round, ActionRequest::Fold).await;
    assert!(outcome.round.phase.is_finished());
    let winner = h.players.player(h.seated[0].id).await.unwrap();
    assert_eq!(winner.stack, 1_010);

    // The next round moves the button and posts fresh blinds.
    let next = h.engine.next_round(h.game_id, round.id).await.unwrap();
    assert_eq!(next.dealer_idx, 1);
    assert_eq!(next.turns[0].action, Action::SmallBlind);
    assert_eq!(next.turns[0].player_id, h.seated[0].id);
    assert_eq!(next.turns[1].action, Action::BigBlind);
    assert_eq!(next.turns[1].player_id, h.seated[1].id);
    assert_eq!(next.turns[2].player_id, h.seated[0].id);

    let small_blind = h.players.player(h.seated[0].id).await.unwrap();
    assert_eq!(small_blind.stack, 1_000);
    let big_blind = h.players.player(h.seated[1].id).await.unwrap();
    assert_eq!(big_blind.stack, 970);

    // Fold straight back and the chips even out again.
    let outcome = act(&h, &next, ActionRequest::Fold).await;
    assert!(outcome.round.phase.is_finished());
    let players = h.players.players_in_game(h.game_id).await.unwrap();
    let total: Chips = players.iter().map(|p| p.stack).sum();
    assert_eq!(total, 2_000);
}

#[tokio::test]
async fn test_concurrent_actions_settle_exactly_once() {
    let h = harness(&[1_000, 1_000, 1_000]).await;
    let round = h.engine.start_round(h.game_id).await.unwrap();
    let open = round.current_on_move().unwrap().id;

    // Two requests race for the same open turn; the round lock lets one
    // through and the other sees a settled turn.
    let (first, second) = tokio::join!(
        h.engine
            .apply_action(h.game_id, round.id, open, ActionRequest::Check),
        h.engine
            .apply_action(h.game_id, round.id, open, ActionRequest::Fold),
    );

    let succeeded = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|&&ok| ok)
        .count();
    assert_eq!(succeeded, 1, "exactly one racer settles the turn");
    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser.unwrap_err(), EngineError::IllegalRoundState(_)));
}
