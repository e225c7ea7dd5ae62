/// Property-based tests for dealing, trick resolution and scoring
///
/// These tests check that card conservation and trick bookkeeping hold for
/// any shuffle and any sequence of legal plays.
use call_break::{
    GameRules, GameState, Phase,
    entities::{Card, Play, PlayerId, Rank, Suit},
    functional::{card_beats, fallback_card, fallback_trump, round_score, trick_winner},
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn card_strategy() -> impl Strategy<Value = Card> {
    (0usize..13, 0usize..4).prop_map(|(rank, suit)| Card::new(Rank::ALL[rank], Suit::ALL[suit]))
}

fn suit_strategy() -> impl Strategy<Value = Suit> {
    (0usize..4).prop_map(|idx| Suit::ALL[idx])
}

// A trick's worth of distinct cards
fn trick_strategy() -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), 2..=4).prop_filter("cards must be unique", |cards| {
        let set: BTreeSet<_> = cards.iter().collect();
        set.len() == cards.len()
    })
}

/// Starts a game and plays the first `tricks` tricks of round one with
/// timeout defaults for every decision.
fn play_tricks(seed: u64, players: usize, tricks: usize) -> (GameState, Vec<PlayerId>) {
    let ids: Vec<PlayerId> = (0..players).map(|_| PlayerId::new()).collect();
    let mut game = GameState::new(GameRules::default(), Some(seed));
    game.start_game(ids.clone(), 1).unwrap();
    game.deal_round().unwrap();

    let chooser = game.round().unwrap().trump_chooser;
    let trump = fallback_trump(game.hand(&chooser).unwrap());
    game.select_trump(&chooser, trump, true).unwrap();
    while game.phase() == Phase::Bidding {
        let id = game.current_player().unwrap();
        game.record_bid(&id, 1).unwrap();
    }

    let mut completed = 0;
    while completed < tricks {
        let id = game.current_player().unwrap();
        let card = fallback_card(&game.legal_cards(&id)).unwrap();
        if game.play_card(&id, card).unwrap().completed_trick.is_some() {
            completed += 1;
        }
    }
    (game, ids)
}

proptest! {
    #[test]
    fn test_deal_gives_disjoint_hands(seed in any::<u64>(), players in 2usize..=4) {
        let (game, ids) = play_tricks(seed, players, 0);

        let mut seen = BTreeSet::new();
        for id in &ids {
            let hand = game.hand(id).unwrap();
            prop_assert_eq!(hand.len(), 13);
            for card in hand {
                prop_assert!(seen.insert(*card), "{} dealt twice", card);
            }
        }
        prop_assert_eq!(seen.len(), 13 * players);
    }

    #[test]
    fn test_hands_shrink_one_card_per_trick(
        seed in any::<u64>(),
        players in 2usize..=4,
        tricks in 0usize..=13,
    ) {
        let (game, ids) = play_tricks(seed, players, tricks);

        for id in &ids {
            prop_assert_eq!(game.hand(id).unwrap().len(), 13 - tricks);
        }
        let round = game.round().unwrap();
        let won: usize = round.tricks_won.values().map(|n| usize::from(*n)).sum();
        prop_assert_eq!(won, tricks);
        prop_assert_eq!(round.tricks_played(), tricks);
        prop_assert!(game.check_invariants().is_ok());
        prop_assert_eq!(game.phase() == Phase::RoundEnd, tricks == 13);
    }

    #[test]
    fn test_trick_winner_is_never_beaten(cards in trick_strategy(), trump in suit_strategy()) {
        let plays: Vec<Play> = cards
            .iter()
            .map(|card| Play { player_id: PlayerId::new(), card: *card })
            .collect();
        let lead = cards[0].suit;
        let winner = trick_winner(&plays, trump).unwrap();

        for (idx, card) in cards.iter().enumerate() {
            if idx != winner {
                prop_assert!(!card_beats(*card, cards[winner], lead, trump));
            }
        }
        // The winner either played trump or followed the lead.
        let winning_suit = cards[winner].suit;
        prop_assert!(winning_suit == trump || winning_suit == lead);
    }

    #[test]
    fn test_round_score_sign_matches_bid(bid in 1u8..=13, tricks in 0u8..=13) {
        let score = round_score(bid, tricks);
        if tricks >= bid {
            prop_assert_eq!(score.tenths(), i32::from(bid) * 10 + i32::from(tricks - bid));
        } else {
            prop_assert_eq!(score.tenths(), -i32::from(bid) * 10);
        }
    }

    #[test]
    fn test_fallback_card_is_lowest_rank(cards in prop::collection::vec(card_strategy(), 1..13)) {
        let chosen = fallback_card(&cards).unwrap();
        prop_assert!(cards.contains(&chosen));
        prop_assert!(cards.iter().all(|card| card.rank >= chosen.rank));
    }
}
