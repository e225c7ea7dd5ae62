use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::BTreeMap,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};
use uuid::Uuid;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    /// All suits in tie-break order (Spades first).
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    pub fn name(self) -> &'static str {
        match self {
            Self::Spades => "spades",
            Self::Hearts => "hearts",
            Self::Diamonds => "diamonds",
            Self::Clubs => "clubs",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spades => "♠",
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for Suit {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "spade" | "spades" | "♠" => Ok(Self::Spades),
            "h" | "heart" | "hearts" | "♥" => Ok(Self::Hearts),
            "d" | "diamond" | "diamonds" | "♦" => Ok(Self::Diamonds),
            "c" | "club" | "clubs" | "♣" => Ok(Self::Clubs),
            _ => Err(CardParseError::Suit(s.to_string())),
        }
    }
}

/// Card ranks, ordered so that `Ace` is the highest.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jack => write!(f, "J"),
            Self::Queen => write!(f, "Q"),
            Self::King => write!(f, "K"),
            Self::Ace => write!(f, "A"),
            other => write!(f, "{}", other.value()),
        }
    }
}

impl FromStr for Rank {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rank = match s.trim().to_ascii_uppercase().as_str() {
            "J" => Self::Jack,
            "Q" => Self::Queen,
            "K" => Self::King,
            "A" | "1" => Self::Ace,
            digits => {
                let value: u8 = digits
                    .parse()
                    .map_err(|_| CardParseError::Rank(s.to_string()))?;
                Self::ALL
                    .into_iter()
                    .find(|rank| rank.value() == value)
                    .ok_or_else(|| CardParseError::Rank(s.to_string()))?
            }
        };
        Ok(rank)
    }
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum CardParseError {
    #[error("not a card: {0:?}")]
    Malformed(String),
    #[error("unknown rank {0:?}")]
    Rank(String),
    #[error("unknown suit {0:?}")]
    Suit(String),
}

/// A playing card. Ordering is suit-major (Spades first) then rank, which is
/// the order hands are sorted in.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { suit, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Parses short notation such as `10H`, `as`, `Q♦`.
impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((split, _)) = s.char_indices().last() else {
            return Err(CardParseError::Malformed(s.to_string()));
        };
        if split == 0 {
            return Err(CardParseError::Malformed(s.to_string()));
        }
        let rank: Rank = s[..split].parse()?;
        let suit: Suit = s[split..].parse()?;
        Ok(Self::new(rank, suit))
    }
}

#[derive(Debug)]
pub struct Deck {
    cards: [Card; 52],
    pub deck_idx: usize,
}

impl Deck {
    /// Returns `None` once every card has been dealt.
    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied()?;
        self.deck_idx += 1;
        Some(card)
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = [Card::new(Rank::Two, Suit::Spades); 52];
        for (i, rank) in Rank::ALL.into_iter().enumerate() {
            for (j, suit) in Suit::ALL.into_iter().enumerate() {
                cards[4 * i + j] = Card::new(rank, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Stable player identity. Clients generate it once and present it again
/// when reconnecting.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PlayerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: &str) -> Self {
        let mut name: String = s
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .take(constants::MAX_NAME_LENGTH)
            .collect();
        if name.is_empty() {
            name.push_str("player");
        }
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for PlayerName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: PlayerName,
    pub connected: bool,
}

/// One card put into a trick.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Play {
    pub player_id: PlayerId,
    pub card: Card,
}

impl fmt::Display for Play {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.card)
    }
}

/// A resolved trick kept for the round's scoring audit.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CompletedTrick {
    pub plays: Vec<Play>,
    pub winner_id: PlayerId,
}

/// Points in tenths, so overtrick bonuses of 0.1 stay exact.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Score(pub i32);

impl Score {
    pub const ZERO: Score = Score(0);

    pub fn from_points(points: i32) -> Self {
        Self(points * 10)
    }

    pub fn tenths(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        match abs % 10 {
            0 => write!(f, "{sign}{}", abs / 10),
            tenths => write!(f, "{sign}{}.{tenths}", abs / 10),
        }
    }
}

impl Add for Score {
    type Output = Score;

    fn add(self, rhs: Self) -> Self::Output {
        Score(self.0 + rhs.0)
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Score {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Score::ZERO, Add::add)
    }
}

/// Archived result of one round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundScores {
    pub round_number: u32,
    pub bids: BTreeMap<PlayerId, u8>,
    pub tricks_won: BTreeMap<PlayerId, u8>,
    pub scores: BTreeMap<PlayerId, Score>,
}
