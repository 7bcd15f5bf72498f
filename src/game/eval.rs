//! Seven-card hand evaluation and winner ranking.
//!
//! Categories are tried strictly from royal flush down to one pair and the
//! first match decides the score bucket; high card is the fallback. Each
//! category also splits the hand into the cards forming the combination and
//! the leftover kickers, which drive the tiebreak comparator.

use enum_dispatch::enum_dispatch;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::entities::{ACE, Card, HandRank, PlayerId, Rank, Suit};

pub const SCORE_ROYAL_FLUSH: u32 = 900;
pub const SCORE_STRAIGHT_FLUSH: u32 = 800;
pub const SCORE_FOUR_OF_A_KIND: u32 = 700;
pub const SCORE_FULL_HOUSE: u32 = 600;
pub const SCORE_FLUSH: u32 = 500;
pub const SCORE_STRAIGHT: u32 = 400;
pub const SCORE_THREE_OF_A_KIND: u32 = 300;
pub const SCORE_TWO_PAIR: u32 = 200;
pub const SCORE_ONE_PAIR: u32 = 100;
pub const SCORE_HIGH_CARD: u32 = 0;

const ROYAL_RANKS: [Rank; 5] = [10, 11, 12, 13, 14];

/// Sorted hand plus the derived counts every category check needs.
struct HandStats {
    /// Cards in descending rank order; equal ranks keep their dealt order.
    cards: Vec<Card>,
    /// Distinct ranks in ascending order.
    ranks_asc: Vec<Rank>,
    rank_counts: BTreeMap<Rank, usize>,
    suit_counts: BTreeMap<Suit, usize>,
    /// Number of ranks appearing exactly four, three, and two times.
    quads: usize,
    trips: usize,
    pairs: usize,
}

impl HandStats {
    fn new(mut cards: Vec<Card>) -> Self {
        cards.sort_by(|a, b| b.0.cmp(&a.0));
        let mut rank_counts: BTreeMap<Rank, usize> = BTreeMap::new();
        let mut suit_counts: BTreeMap<Suit, usize> = BTreeMap::new();
        for card in &cards {
            *rank_counts.entry(card.0).or_insert(0) += 1;
            *suit_counts.entry(card.1).or_insert(0) += 1;
        }
        let ranks_asc: Vec<Rank> = rank_counts.keys().copied().collect();
        let (mut quads, mut trips, mut pairs) = (0, 0, 0);
        for &count in rank_counts.values() {
            match count {
                4 => quads += 1,
                3 => trips += 1,
                2 => pairs += 1,
                _ => {}
            }
        }
        Self {
            cards,
            ranks_asc,
            rank_counts,
            suit_counts,
            quads,
            trips,
            pairs,
        }
    }

    /// Highest rank appearing exactly `count` times. Ties between ranks of
    /// the same count resolve toward the stronger rank.
    fn highest_rank_with_count(&self, count: usize) -> Option<Rank> {
        self.rank_counts
            .iter()
            .rev()
            .find(|&(_, &c)| c == count)
            .map(|(&rank, _)| rank)
    }

    fn flush_suit(&self) -> Option<Suit> {
        self.suit_counts
            .iter()
            .find(|&(_, &count)| count >= 5)
            .map(|(&suit, _)| suit)
    }

    /// Ranks held in one suit, ascending. Distinct by construction.
    fn suit_ranks_asc(&self, suit: Suit) -> Vec<Rank> {
        let mut ranks: Vec<Rank> = self
            .cards
            .iter()
            .filter(|c| c.1 == suit)
            .map(|c| c.0)
            .collect();
        ranks.sort_unstable();
        ranks
    }

    /// Partition the sorted hand into (combination, kickers), both keeping
    /// descending order.
    fn split_by(&self, keep: impl Fn(&Card) -> bool) -> (Vec<Card>, Vec<Card>) {
        let mut combination = Vec::new();
        let mut kickers = Vec::new();
        for &card in &self.cards {
            if keep(&card) {
                combination.push(card);
            } else {
                kickers.push(card);
            }
        }
        (combination, kickers)
    }
}

/// At least five consecutive ranks, or the wheel (ace played low under
/// 2-3-4-5). Input must be distinct ranks in ascending order.
fn is_straight(ranks_asc: &[Rank]) -> bool {
    let mut consecutive = 1;
    for pair in ranks_asc.windows(2) {
        if pair[1] == pair[0] + 1 {
            consecutive += 1;
            if consecutive >= 5 {
                return true;
            }
        } else {
            consecutive = 1;
        }
    }
    ranks_asc.len() >= 4 && ranks_asc.contains(&ACE) && ranks_asc[..4] == [2, 3, 4, 5]
}

/// Behavior common to all scored hand categories. `matches` is checked in
/// strict table order and the first hit wins, so every `split` may assume
/// no higher category matched.
#[enum_dispatch]
trait RankCategory {
    /// Score bucket this category awards.
    fn score(&self) -> u32;
    /// Whether the hand contains this category.
    fn matches(&self, stats: &HandStats) -> bool;
    /// Partition the hand into combination cards and kickers.
    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>);
}

struct RoyalFlush;
struct StraightFlush;
struct FourOfAKind;
struct FullHouse;
struct Flush;
struct Straight;
struct ThreeOfAKind;
struct TwoPair;
struct OnePair;

impl RankCategory for RoyalFlush {
    fn score(&self) -> u32 {
        SCORE_ROYAL_FLUSH
    }

    fn matches(&self, stats: &HandStats) -> bool {
        Suit::ALL.iter().any(|&suit| {
            ROYAL_RANKS
                .iter()
                .all(|&rank| stats.cards.iter().any(|c| c.0 == rank && c.1 == suit))
        })
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        // The suit comes from the first royal-ranked card in descending
        // order, even when an off-suit ace or king sorts ahead of the
        // royal suit itself.
        let suit = stats
            .cards
            .iter()
            .find(|c| ROYAL_RANKS.contains(&c.0))
            .map(|c| c.1);
        match suit {
            Some(suit) => stats.split_by(|c| ROYAL_RANKS.contains(&c.0) && c.1 == suit),
            None => (Vec::new(), stats.cards.clone()),
        }
    }
}

impl RankCategory for StraightFlush {
    fn score(&self) -> u32 {
        SCORE_STRAIGHT_FLUSH
    }

    fn matches(&self, stats: &HandStats) -> bool {
        Suit::ALL.iter().any(|&suit| {
            let ranks = stats.suit_ranks_asc(suit);
            ranks.len() >= 5 && is_straight(&ranks)
        })
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        // The window is the five lowest distinct ranks of the whole hand;
        // the suit comes from the first card in the window by descending
        // order.
        if stats.ranks_asc.len() < 5 {
            return (Vec::new(), stats.cards.clone());
        }
        let window = &stats.ranks_asc[..5];
        let suit = stats
            .cards
            .iter()
            .find(|c| window.contains(&c.0))
            .map(|c| c.1);
        match suit {
            Some(suit) => stats.split_by(|c| window.contains(&c.0) && c.1 == suit),
            None => (Vec::new(), stats.cards.clone()),
        }
    }
}

impl RankCategory for FourOfAKind {
    fn score(&self) -> u32 {
        SCORE_FOUR_OF_A_KIND
    }

    fn matches(&self, stats: &HandStats) -> bool {
        stats.quads > 0
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        match stats.highest_rank_with_count(4) {
            Some(rank) => stats.split_by(|c| c.0 == rank),
            None => (Vec::new(), stats.cards.clone()),
        }
    }
}

impl RankCategory for FullHouse {
    fn score(&self) -> u32 {
        SCORE_FULL_HOUSE
    }

    /// Needs a rank counted exactly three times and another counted exactly
    /// twice. Two bare trips do not qualify; they fall through to three of
    /// a kind.
    fn matches(&self, stats: &HandStats) -> bool {
        stats.trips >= 1 && stats.pairs >= 1
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        let (three, pair) = (
            stats.highest_rank_with_count(3),
            stats.highest_rank_with_count(2),
        );
        match (three, pair) {
            (Some(three), Some(pair)) => {
                let combination: Vec<Card> = stats
                    .cards
                    .iter()
                    .filter(|c| c.0 == three || c.0 == pair)
                    .copied()
                    .collect();
                // Kickers keep the whole hand. A five-card combination
                // leaves zero kicker slots, so none are ever compared.
                (combination, stats.cards.clone())
            }
            _ => (Vec::new(), stats.cards.clone()),
        }
    }
}

impl RankCategory for Flush {
    fn score(&self) -> u32 {
        SCORE_FLUSH
    }

    fn matches(&self, stats: &HandStats) -> bool {
        stats.flush_suit().is_some()
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        // Every card of the flush suit joins the combination, which can
        // therefore hold six or seven cards.
        match stats.flush_suit() {
            Some(suit) => stats.split_by(|c| c.1 == suit),
            None => (Vec::new(), stats.cards.clone()),
        }
    }
}

impl RankCategory for Straight {
    fn score(&self) -> u32 {
        SCORE_STRAIGHT
    }

    fn matches(&self, stats: &HandStats) -> bool {
        is_straight(&stats.ranks_asc)
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        // Every rank in the hand is one of its own distinct ranks, so the
        // whole hand is the combination and no kickers remain.
        (stats.cards.clone(), Vec::new())
    }
}

impl RankCategory for ThreeOfAKind {
    fn score(&self) -> u32 {
        SCORE_THREE_OF_A_KIND
    }

    fn matches(&self, stats: &HandStats) -> bool {
        stats.trips > 0
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        match stats.highest_rank_with_count(3) {
            Some(rank) => stats.split_by(|c| c.0 == rank),
            None => (Vec::new(), stats.cards.clone()),
        }
    }
}

impl RankCategory for TwoPair {
    fn score(&self) -> u32 {
        SCORE_TWO_PAIR
    }

    fn matches(&self, stats: &HandStats) -> bool {
        stats.pairs >= 2
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        // A seven-card hand can hold three pairs; the two highest count.
        let pair_ranks: Vec<Rank> = stats
            .rank_counts
            .iter()
            .rev()
            .filter(|&(_, &count)| count == 2)
            .map(|(&rank, _)| rank)
            .take(2)
            .collect();
        stats.split_by(|c| pair_ranks.contains(&c.0))
    }
}

impl RankCategory for OnePair {
    fn score(&self) -> u32 {
        SCORE_ONE_PAIR
    }

    fn matches(&self, stats: &HandStats) -> bool {
        stats.pairs == 1
    }

    fn split(&self, stats: &HandStats) -> (Vec<Card>, Vec<Card>) {
        match stats.highest_rank_with_count(2) {
            Some(rank) => stats.split_by(|c| c.0 == rank),
            None => (Vec::new(), stats.cards.clone()),
        }
    }
}

#[enum_dispatch(RankCategory)]
enum Category {
    RoyalFlush,
    StraightFlush,
    FourOfAKind,
    FullHouse,
    Flush,
    Straight,
    ThreeOfAKind,
    TwoPair,
    OnePair,
}

/// Scored categories in strict priority order. High card is not listed;
/// it is the fallback when nothing matches.
const CATEGORIES: [Category; 9] = [
    Category::RoyalFlush(RoyalFlush),
    Category::StraightFlush(StraightFlush),
    Category::FourOfAKind(FourOfAKind),
    Category::FullHouse(FullHouse),
    Category::Flush(Flush),
    Category::Straight(Straight),
    Category::ThreeOfAKind(ThreeOfAKind),
    Category::TwoPair(TwoPair),
    Category::OnePair(OnePair),
];

/// Evaluate a hand of hole plus community cards (up to seven). Returns
/// `None` for an empty hand; such players are left out of the ranking.
#[must_use]
pub fn evaluate(cards: Vec<Card>) -> Option<HandRank> {
    if cards.is_empty() {
        return None;
    }
    let stats = HandStats::new(cards);
    for category in &CATEGORIES {
        if category.matches(&stats) {
            let (combination, kickers) = category.split(&stats);
            return Some(HandRank {
                score: category.score(),
                combination,
                kickers,
            });
        }
    }
    Some(HandRank {
        score: SCORE_HIGH_CARD,
        combination: Vec::new(),
        kickers: stats.cards,
    })
}

/// Score bucket alone, for showing the live strength of a partial hand.
#[must_use]
pub fn hand_score(cards: Vec<Card>) -> u32 {
    evaluate(cards).map_or(SCORE_HIGH_CARD, |rank| rank.score)
}

/// Strength ordering for two hands of the same score bucket: combination
/// card ranks positionally first, then the top kickers filling the hand
/// out to five cards. Missing slots rank below any real card.
/// `Ordering::Greater` means `a` is the stronger hand.
#[must_use]
pub fn compare_hands(a: &HandRank, b: &HandRank) -> Ordering {
    let slots = a.combination.len().max(b.combination.len());
    for i in 0..slots {
        let a_rank = a.combination.get(i).map_or(0, |c| c.0);
        let b_rank = b.combination.get(i).map_or(0, |c| c.0);
        match a_rank.cmp(&b_rank) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    compare_kickers(a, b)
}

fn compare_kickers(a: &HandRank, b: &HandRank) -> Ordering {
    let take = 5usize.saturating_sub(a.combination.len().max(b.combination.len()));
    let a_top = top_ranks(&a.kickers, take);
    let b_top = top_ranks(&b.kickers, take);
    for i in 0..take {
        let a_rank = a_top.get(i).copied().unwrap_or(0);
        let b_rank = b_top.get(i).copied().unwrap_or(0);
        match a_rank.cmp(&b_rank) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

fn top_ranks(cards: &[Card], take: usize) -> Vec<Rank> {
    let mut ranks: Vec<Rank> = cards.iter().map(|c| c.0).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));
    ranks.truncate(take);
    ranks
}

/// Group players into descending strength tiers: by score bucket first,
/// then by the tiebreak comparator inside a bucket. Players whose hands
/// compare equal share a tier and will split what that tier wins.
#[must_use]
pub fn rank_groups(ranks: &HashMap<PlayerId, HandRank>) -> Vec<Vec<PlayerId>> {
    let mut by_score: BTreeMap<u32, Vec<(PlayerId, &HandRank)>> = BTreeMap::new();
    for (&player_id, rank) in ranks {
        by_score.entry(rank.score).or_default().push((player_id, rank));
    }

    let mut groups: Vec<Vec<PlayerId>> = Vec::new();
    for (_, mut entries) in by_score.into_iter().rev() {
        if entries.len() == 1 {
            groups.push(vec![entries[0].0]);
            continue;
        }
        entries.sort_by(|(a_id, a), (b_id, b)| {
            compare_hands(b, a).then_with(|| a_id.cmp(b_id))
        });
        let mut current: Vec<PlayerId> = Vec::new();
        let mut previous: Option<&HandRank> = None;
        for (player_id, rank) in entries {
            if let Some(prev) = previous {
                if compare_hands(prev, rank) != Ordering::Equal {
                    groups.push(std::mem::take(&mut current));
                }
            }
            current.push(player_id);
            previous = Some(rank);
        }
        if !current.is_empty() {
            groups.push(current);
        }
    }
    groups
}
