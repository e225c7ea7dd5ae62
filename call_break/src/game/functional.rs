//! Pure trick-taking rules: suit following, trick resolution, scoring and
//! the deterministic defaults used when a player times out.

use std::cmp::Ordering;

use super::entities::{Card, Play, Score, Suit};

pub fn hand_has_suit(hand: &[Card], suit: Suit) -> bool {
    hand.iter().any(|c| c.suit == suit)
}

/// Cards from `hand` that may be put into a trick led with `led`.
///
/// A player holding the led suit must follow it; otherwise, or when
/// leading, any card is legal. The result is sorted.
pub fn legal_cards(hand: &[Card], led: Option<Suit>) -> Vec<Card> {
    let mut cards: Vec<Card> = match led {
        Some(suit) if hand_has_suit(hand, suit) => {
            hand.iter().copied().filter(|c| c.suit == suit).collect()
        }
        _ => hand.to_vec(),
    };
    cards.sort();
    cards
}

pub fn is_legal_play(hand: &[Card], led: Option<Suit>, card: Card) -> bool {
    if !hand.contains(&card) {
        return false;
    }
    match led {
        Some(suit) if card.suit != suit => !hand_has_suit(hand, suit),
        _ => true,
    }
}

/// Returns true if `a` beats `b` in a trick led with `lead`.
pub fn card_beats(a: Card, b: Card, lead: Suit, trump: Suit) -> bool {
    let a_trump = a.suit == trump;
    let b_trump = b.suit == trump;
    if a_trump != b_trump {
        return a_trump;
    }
    if a_trump {
        return a.rank > b.rank;
    }
    let a_follows = a.suit == lead;
    let b_follows = b.suit == lead;
    if a_follows != b_follows {
        return a_follows;
    }
    a_follows && a.rank > b.rank
}

/// Index into `plays` of the winning card, or `None` for an empty trick.
pub fn trick_winner(plays: &[Play], trump: Suit) -> Option<usize> {
    let lead = plays.first()?.card.suit;
    let mut best = 0;
    for (idx, play) in plays.iter().enumerate().skip(1) {
        if card_beats(play.card, plays[best].card, lead, trump) {
            best = idx;
        }
    }
    Some(best)
}

/// Meeting the bid scores the bid plus a tenth per overtrick; falling short
/// loses the bid.
pub fn round_score(bid: u8, tricks_won: u8) -> Score {
    let bid = i32::from(bid);
    let tricks = i32::from(tricks_won);
    if tricks >= bid {
        Score(bid * 10 + (tricks - bid))
    } else {
        Score(-bid * 10)
    }
}

/// The suit the hand holds most of; ties go to the earlier suit in
/// [`Suit::ALL`].
pub fn fallback_trump(hand: &[Card]) -> Suit {
    let mut best = Suit::Spades;
    let mut best_count = 0;
    for suit in Suit::ALL {
        let count = hand.iter().filter(|c| c.suit == suit).count();
        if count > best_count {
            best = suit;
            best_count = count;
        }
    }
    best
}

/// Lowest-ranked card among `legal`, breaking rank ties by suit order.
pub fn fallback_card(legal: &[Card]) -> Option<Card> {
    legal
        .iter()
        .copied()
        .min_by(|a, b| match a.rank.cmp(&b.rank) {
            Ordering::Equal => a.suit.cmp(&b.suit),
            ord => ord,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{PlayerId, Rank};

    fn c(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn plays(cards: &[&str]) -> Vec<Play> {
        cards
            .iter()
            .map(|card| Play {
                player_id: PlayerId::new(),
                card: c(card),
            })
            .collect()
    }

    #[test]
    fn test_legal_cards_must_follow_led_suit() {
        let hand = vec![c("2H"), c("KS"), c("10H"), c("3C")];
        assert_eq!(legal_cards(&hand, Some(Suit::Hearts)), vec![c("2H"), c("10H")]);
    }

    #[test]
    fn test_legal_cards_void_in_led_suit() {
        let hand = vec![c("2H"), c("KS"), c("3C")];
        assert_eq!(legal_cards(&hand, Some(Suit::Diamonds)).len(), 3);
        assert_eq!(legal_cards(&hand, None).len(), 3);
    }

    #[test]
    fn test_is_legal_play() {
        let hand = vec![c("2H"), c("KS")];
        assert!(is_legal_play(&hand, Some(Suit::Hearts), c("2H")));
        assert!(!is_legal_play(&hand, Some(Suit::Hearts), c("KS")));
        assert!(is_legal_play(&hand, Some(Suit::Clubs), c("KS")));
        assert!(!is_legal_play(&hand, None, c("AS")));
    }

    #[test]
    fn test_card_beats() {
        let lead = Suit::Hearts;
        let trump = Suit::Spades;
        assert!(card_beats(c("AH"), c("KH"), lead, trump));
        assert!(!card_beats(c("10H"), c("AH"), lead, trump));
        assert!(card_beats(c("2S"), c("AH"), lead, trump));
        assert!(card_beats(c("3S"), c("2S"), lead, trump));
        assert!(card_beats(c("2H"), c("AD"), lead, trump));
        assert!(!card_beats(c("AD"), c("2H"), lead, trump));
    }

    #[test]
    fn test_trump_wins_over_led_suit() {
        let trick = plays(&["10H", "5H", "KH", "2S"]);
        assert_eq!(trick_winner(&trick, Suit::Spades), Some(3));
    }

    #[test]
    fn test_highest_of_led_suit_without_trump() {
        let trick = plays(&["10H", "5H", "KH", "AD"]);
        assert_eq!(trick_winner(&trick, Suit::Spades), Some(2));
    }

    #[test]
    fn test_highest_trump_among_several() {
        let trick = plays(&["AH", "3S", "QS", "2S"]);
        assert_eq!(trick_winner(&trick, Suit::Spades), Some(2));
        assert_eq!(trick_winner(&[], Suit::Spades), None);
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(3, 3), Score(30));
        assert_eq!(round_score(3, 5), Score(32));
        assert_eq!(round_score(4, 2), Score(-40));
        assert_eq!(round_score(1, 13), Score(22));
    }

    #[test]
    fn test_fallback_trump_prefers_longest_suit() {
        let hand = vec![c("2H"), c("3H"), c("4C"), c("5C"), c("6C")];
        assert_eq!(fallback_trump(&hand), Suit::Clubs);
    }

    #[test]
    fn test_fallback_trump_tie_break() {
        let hand = vec![c("2D"), c("3D"), c("4H"), c("5H")];
        assert_eq!(fallback_trump(&hand), Suit::Hearts);
        assert_eq!(fallback_trump(&[]), Suit::Spades);
    }

    #[test]
    fn test_fallback_card_is_lowest_rank() {
        let legal = vec![c("KS"), c("2D"), c("2H"), c("9C")];
        assert_eq!(fallback_card(&legal), Some(Card::new(Rank::Two, Suit::Hearts)));
        assert_eq!(fallback_card(&[]), None);
    }
}
