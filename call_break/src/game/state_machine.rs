//! Call Break rules state.
//!
//! [`GameState`] owns the hands, bids, tricks and scores of one game and
//! exposes the validated operations that move it through its phases:
//!
//! ```text
//! Lobby -> Dealing -> TrumpSelection -> Bidding -> Playing -> RoundEnd -> {Dealing | GameEnd}
//! ```
//!
//! Every operation checks the phase and whose turn it is before touching
//! anything, so a rejected operation never leaves partial changes behind.

use log::{debug, error};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

use super::{
    constants::{CARDS_PER_PLAYER, DEFAULT_MAX_BID, DEFAULT_MIN_BID, MAX_PLAYERS, TRICKS_PER_ROUND},
    entities::{Card, CompletedTrick, Deck, Play, PlayerId, RoundScores, Score, Suit},
    functional,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Phase {
    Lobby,
    Dealing,
    TrumpSelection,
    Bidding,
    Playing,
    RoundEnd,
    GameEnd,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Lobby => "lobby",
            Self::Dealing => "dealing",
            Self::TrumpSelection => "trump selection",
            Self::Bidding => "bidding",
            Self::Playing => "playing",
            Self::RoundEnd => "round end",
            Self::GameEnd => "game end",
        };
        write!(f, "{repr}")
    }
}

/// Why a card was refused.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CardRejection {
    NotInHand,
    MustFollowSuit(Suit),
}

impl fmt::Display for CardRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInHand => write!(f, "not in hand"),
            Self::MustFollowSuit(suit) => write!(f, "must follow {}", suit.name()),
        }
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GameError {
    #[error("can't {action} during {phase}")]
    IllegalPhaseTransition { phase: Phase, action: &'static str },
    #[error("not your turn")]
    OutOfTurn { expected: PlayerId },
    #[error("bid {amount} outside {min}..={max}")]
    InvalidBid { amount: u8, min: u8, max: u8 },
    #[error("can't play {card}: {reason}")]
    InvalidCard { card: Card, reason: CardRejection },
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("need 2 to 4 distinct players, got {0}")]
    InvalidPlayerCount(usize),
    #[error("invalid game state: {0}")]
    InvariantViolation(String),
}

impl GameError {
    /// Invariant violations are the only errors a session can't recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameRules {
    pub min_bid: u8,
    pub max_bid: u8,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            min_bid: DEFAULT_MIN_BID,
            max_bid: DEFAULT_MAX_BID,
        }
    }
}

/// The round currently being played.
#[derive(Clone, Debug)]
pub struct Round {
    pub round_number: u32,
    pub trump_suit: Option<Suit>,
    pub trump_chooser: PlayerId,
    pub auto_selected: bool,
    pub bids: BTreeMap<PlayerId, u8>,
    pub tricks_won: BTreeMap<PlayerId, u8>,
    pub trick_history: Vec<CompletedTrick>,
    pub current_trick: Vec<Play>,
    /// Index into the player order of whoever acts next.
    turn: usize,
}

impl Round {
    pub fn led_suit(&self) -> Option<Suit> {
        self.current_trick.first().map(|play| play.card.suit)
    }

    pub fn tricks_played(&self) -> usize {
        self.trick_history.len()
    }
}

/// What happened as a result of a single card being played.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayOutcome {
    /// Set when the card completed a trick.
    pub completed_trick: Option<CompletedTrick>,
    /// The winner's trick count after the trick was resolved.
    pub winner_tricks: u8,
    pub round_complete: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FinalStandings {
    /// Totals in seating order.
    pub totals: Vec<(PlayerId, Score)>,
    pub winner_id: PlayerId,
}

#[derive(Debug)]
pub struct GameState {
    rules: GameRules,
    rng: StdRng,
    deck: Deck,
    phase: Phase,
    player_order: Vec<PlayerId>,
    num_rounds: u32,
    current_round: u32,
    hands: BTreeMap<PlayerId, Vec<Card>>,
    round: Option<Round>,
    history: Vec<RoundScores>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameRules::default(), None)
    }
}

impl GameState {
    /// Creates a game in the lobby. A seed makes dealing reproducible.
    pub fn new(rules: GameRules, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rules,
            rng,
            deck: Deck::default(),
            phase: Phase::Lobby,
            player_order: Vec::with_capacity(MAX_PLAYERS),
            num_rounds: 0,
            current_round: 0,
            hands: BTreeMap::new(),
            round: None,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> GameRules {
        self.rules
    }

    pub fn player_order(&self) -> &[PlayerId] {
        &self.player_order
    }

    pub fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn round_history(&self) -> &[RoundScores] {
        &self.history
    }

    pub fn hand(&self, player_id: &PlayerId) -> Option<&[Card]> {
        self.hands.get(player_id).map(Vec::as_slice)
    }

    pub fn is_player(&self, player_id: &PlayerId) -> bool {
        self.player_order.contains(player_id)
    }

    /// The player the game is waiting on, if any.
    pub fn current_player(&self) -> Option<PlayerId> {
        let round = self.round.as_ref()?;
        match self.phase {
            Phase::TrumpSelection => Some(round.trump_chooser),
            Phase::Bidding | Phase::Playing => self.player_order.get(round.turn).copied(),
            _ => None,
        }
    }

    /// Cards the player may legally play right now. Empty outside of their turn.
    pub fn legal_cards(&self, player_id: &PlayerId) -> Vec<Card> {
        if self.phase != Phase::Playing || self.current_player() != Some(*player_id) {
            return Vec::new();
        }
        let (Some(round), Some(hand)) = (self.round.as_ref(), self.hands.get(player_id)) else {
            return Vec::new();
        };
        functional::legal_cards(hand, round.led_suit())
    }

    fn require_phase(&self, phase: Phase, action: &'static str) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::IllegalPhaseTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn require_round(&self) -> Result<&Round, GameError> {
        self.round
            .as_ref()
            .ok_or_else(|| GameError::InvariantViolation("no active round".to_string()))
    }

    fn require_turn(&self, player_id: &PlayerId) -> Result<(), GameError> {
        if !self.is_player(player_id) {
            return Err(GameError::UnknownPlayer(*player_id));
        }
        let round = self.require_round()?;
        let expected = *self.player_order.get(round.turn).ok_or_else(|| {
            GameError::InvariantViolation(format!("turn index {} out of bounds", round.turn))
        })?;
        if expected == *player_id {
            Ok(())
        } else {
            Err(GameError::OutOfTurn { expected })
        }
    }

    fn seat_of(&self, player_id: &PlayerId) -> Result<usize, GameError> {
        self.player_order
            .iter()
            .position(|id| id == player_id)
            .ok_or(GameError::UnknownPlayer(*player_id))
    }

    /// Seats the players and leaves the lobby.
    pub fn start_game(
        &mut self,
        player_order: Vec<PlayerId>,
        num_rounds: u32,
    ) -> Result<(), GameError> {
        self.require_phase(Phase::Lobby, "start the game")?;
        if player_order.is_empty() || num_rounds == 0 {
            return Err(GameError::IllegalPhaseTransition {
                phase: self.phase,
                action: "start an empty game",
            });
        }
        let mut distinct = player_order.clone();
        distinct.sort();
        distinct.dedup();
        if player_order.len() < 2
            || player_order.len() > MAX_PLAYERS
            || distinct.len() != player_order.len()
        {
            return Err(GameError::InvalidPlayerCount(player_order.len()));
        }
        debug!(
            "starting game with {} players over {num_rounds} rounds",
            player_order.len()
        );
        self.player_order = player_order;
        self.num_rounds = num_rounds;
        self.current_round = 0;
        self.history.clear();
        self.phase = Phase::Dealing;
        Ok(())
    }

    /// Shuffles and deals 13 cards to every player for the next round.
    pub fn deal_round(&mut self) -> Result<&Round, GameError> {
        self.require_phase(Phase::Dealing, "deal")?;
        self.deck.shuffle(&mut self.rng);
        let mut hands = Vec::with_capacity(self.player_order.len());
        for _ in &self.player_order {
            let mut hand = Vec::with_capacity(CARDS_PER_PLAYER);
            for _ in 0..CARDS_PER_PLAYER {
                let card = self.deck.deal_card().ok_or_else(|| {
                    GameError::InvariantViolation("deck ran out of cards".to_string())
                })?;
                hand.push(card);
            }
            hands.push(hand);
        }
        self.install_round(hands)
    }

    /// Deals a prearranged set of hands, one per seat in player order.
    /// Useful for replaying a known deal.
    pub fn deal_prearranged(&mut self, hands: Vec<Vec<Card>>) -> Result<&Round, GameError> {
        self.require_phase(Phase::Dealing, "deal")?;
        if hands.len() != self.player_order.len() {
            return Err(GameError::InvariantViolation(format!(
                "{} hands for {} players",
                hands.len(),
                self.player_order.len()
            )));
        }
        let mut all: Vec<Card> = hands.iter().flatten().copied().collect();
        let total = all.len();
        all.sort();
        all.dedup();
        if all.len() != total || hands.iter().any(|hand| hand.len() != CARDS_PER_PLAYER) {
            return Err(GameError::InvariantViolation(
                "prearranged hands must hold 13 distinct cards each".to_string(),
            ));
        }
        self.install_round(hands)
    }

    fn install_round(&mut self, hands: Vec<Vec<Card>>) -> Result<&Round, GameError> {
        let round_number = self.current_round + 1;
        let num_players = self.player_order.len();
        let chooser_idx = (round_number as usize - 1) % num_players;
        let trump_chooser = self.player_order[chooser_idx];

        self.hands.clear();
        for (player_id, mut hand) in self.player_order.iter().copied().zip(hands) {
            hand.sort();
            self.hands.insert(player_id, hand);
        }

        self.current_round = round_number;
        self.phase = Phase::TrumpSelection;
        debug!("dealt round {round_number}, {trump_chooser} chooses trump");
        let round = self.round.insert(Round {
            round_number,
            trump_suit: None,
            trump_chooser,
            auto_selected: false,
            bids: BTreeMap::new(),
            tricks_won: self.player_order.iter().map(|id| (*id, 0)).collect(),
            trick_history: Vec::with_capacity(TRICKS_PER_ROUND),
            current_trick: Vec::with_capacity(num_players),
            turn: chooser_idx,
        });
        Ok(&*round)
    }

    /// Sets the round's trump. Only the designated chooser may do this, and
    /// only once per round.
    pub fn select_trump(
        &mut self,
        chooser: &PlayerId,
        suit: Suit,
        auto_selected: bool,
    ) -> Result<(), GameError> {
        self.require_phase(Phase::TrumpSelection, "choose trump")?;
        if !self.is_player(chooser) {
            return Err(GameError::UnknownPlayer(*chooser));
        }
        let chooser_idx = self.seat_of(chooser)?;
        let round = self
            .round
            .as_mut()
            .ok_or_else(|| GameError::InvariantViolation("no active round".to_string()))?;
        if round.trump_chooser != *chooser {
            return Err(GameError::OutOfTurn {
                expected: round.trump_chooser,
            });
        }
        if round.trump_suit.is_some() {
            return Err(GameError::InvariantViolation(
                "trump already selected".to_string(),
            ));
        }
        round.trump_suit = Some(suit);
        round.auto_selected = auto_selected;
        round.turn = chooser_idx;
        self.phase = Phase::Bidding;
        debug!("round {} trump is {}", round.round_number, suit.name());
        Ok(())
    }

    /// Records a bid. Returns true once every player has bid and play begins.
    pub fn record_bid(&mut self, player_id: &PlayerId, amount: u8) -> Result<bool, GameError> {
        self.require_phase(Phase::Bidding, "bid")?;
        self.require_turn(player_id)?;
        let GameRules { min_bid, max_bid } = self.rules;
        if !(min_bid..=max_bid).contains(&amount) {
            return Err(GameError::InvalidBid {
                amount,
                min: min_bid,
                max: max_bid,
            });
        }

        let num_players = self.player_order.len();
        let chooser_idx = self.seat_of(&self.require_round()?.trump_chooser)?;
        let round = self
            .round
            .as_mut()
            .ok_or_else(|| GameError::InvariantViolation("no active round".to_string()))?;
        if round.bids.insert(*player_id, amount).is_some() {
            return Err(GameError::InvariantViolation(format!(
                "{player_id} bid twice"
            )));
        }
        debug!("{player_id} bids {amount}");

        if round.bids.len() == num_players {
            round.turn = chooser_idx;
            self.phase = Phase::Playing;
            return Ok(true);
        }
        round.turn = (round.turn + 1) % num_players;
        Ok(false)
    }

    /// Puts a card from the player's hand into the current trick, resolving
    /// the trick once everybody has played.
    pub fn play_card(&mut self, player_id: &PlayerId, card: Card) -> Result<PlayOutcome, GameError> {
        self.require_phase(Phase::Playing, "play a card")?;
        self.require_turn(player_id)?;

        let round = self.require_round()?;
        let trump = round
            .trump_suit
            .ok_or_else(|| GameError::InvariantViolation("playing without trump".to_string()))?;
        let led = round.led_suit();
        let hand = self
            .hands
            .get(player_id)
            .ok_or(GameError::UnknownPlayer(*player_id))?;
        let Some(pos) = hand.iter().position(|c| *c == card) else {
            return Err(GameError::InvalidCard {
                card,
                reason: CardRejection::NotInHand,
            });
        };
        if !functional::is_legal_play(hand, led, card) {
            return Err(GameError::InvalidCard {
                card,
                reason: CardRejection::MustFollowSuit(led.unwrap_or(card.suit)),
            });
        }

        let num_players = self.player_order.len();
        if let Some(hand) = self.hands.get_mut(player_id) {
            hand.remove(pos);
        }
        let round = self
            .round
            .as_mut()
            .ok_or_else(|| GameError::InvariantViolation("no active round".to_string()))?;
        round.current_trick.push(Play {
            player_id: *player_id,
            card,
        });
        debug!("{player_id} plays {card}");

        if round.current_trick.len() < num_players {
            round.turn = (round.turn + 1) % num_players;
            return Ok(PlayOutcome {
                completed_trick: None,
                winner_tricks: 0,
                round_complete: false,
            });
        }

        let winner_idx = functional::trick_winner(&round.current_trick, trump)
            .ok_or_else(|| GameError::InvariantViolation("empty trick".to_string()))?;
        let winner_id = round.current_trick[winner_idx].player_id;
        let plays = std::mem::take(&mut round.current_trick);
        let count = round.tricks_won.entry(winner_id).or_insert(0);
        *count += 1;
        let winner_tricks = *count;
        let trick = CompletedTrick { plays, winner_id };
        round.trick_history.push(trick.clone());
        round.turn = self
            .player_order
            .iter()
            .position(|id| *id == winner_id)
            .ok_or(GameError::UnknownPlayer(winner_id))?;

        let round_complete = round.trick_history.len() == TRICKS_PER_ROUND;
        self.check_invariants()?;
        if round_complete {
            self.phase = Phase::RoundEnd;
        }
        Ok(PlayOutcome {
            completed_trick: Some(trick),
            winner_tricks,
            round_complete,
        })
    }

    /// Verifies hand sizes against tricks played and, once a round is over,
    /// that exactly 13 tricks were won.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        let Some(round) = self.round.as_ref() else {
            return Ok(());
        };
        let played = round.tricks_played();
        for player_id in &self.player_order {
            let in_trick = round
                .current_trick
                .iter()
                .filter(|play| play.player_id == *player_id)
                .count();
            if in_trick > 1 {
                return Err(self.violation(format!("{player_id} played twice in one trick")));
            }
            let held = self.hands.get(player_id).map_or(0, Vec::len);
            if held + played + in_trick != CARDS_PER_PLAYER {
                return Err(self.violation(format!(
                    "{player_id} holds {held} cards after {played} tricks"
                )));
            }
        }
        let won: usize = round.tricks_won.values().map(|n| usize::from(*n)).sum();
        if won != played {
            return Err(self.violation(format!("{won} tricks won out of {played} played")));
        }
        Ok(())
    }

    fn violation(&self, reason: String) -> GameError {
        error!("round {}: {reason}", self.current_round);
        GameError::InvariantViolation(reason)
    }

    /// The finished round's scores, available once all 13 tricks are played.
    pub fn round_scores(&self) -> Result<RoundScores, GameError> {
        self.require_phase(Phase::RoundEnd, "score the round")?;
        let round = self.require_round()?;
        let won: usize = round.tricks_won.values().map(|n| usize::from(*n)).sum();
        if won != TRICKS_PER_ROUND {
            return Err(self.violation(format!("round closed with {won} tricks won")));
        }
        let mut scores = BTreeMap::new();
        for player_id in &self.player_order {
            let bid = *round
                .bids
                .get(player_id)
                .ok_or_else(|| self.violation(format!("{player_id} has no bid")))?;
            let tricks = round.tricks_won.get(player_id).copied().unwrap_or(0);
            scores.insert(*player_id, functional::round_score(bid, tricks));
        }
        Ok(RoundScores {
            round_number: round.round_number,
            bids: round.bids.clone(),
            tricks_won: round.tricks_won.clone(),
            scores,
        })
    }

    /// Archives the finished round and moves on to the next deal, or to the
    /// end of the game after the last round.
    pub fn end_round(&mut self) -> Result<RoundScores, GameError> {
        let scores = self.round_scores()?;
        self.history.push(scores.clone());
        self.round = None;
        self.hands.clear();
        self.phase = if self.current_round >= self.num_rounds {
            Phase::GameEnd
        } else {
            Phase::Dealing
        };
        Ok(scores)
    }

    /// Sum of archived round scores, plus the finished but not yet archived
    /// round while in `RoundEnd`.
    pub fn total_scores(&self) -> BTreeMap<PlayerId, Score> {
        let mut totals: BTreeMap<PlayerId, Score> =
            self.player_order.iter().map(|id| (*id, Score::ZERO)).collect();
        let pending = self.round_scores().ok();
        for round in self.history.iter().chain(pending.iter()) {
            for (player_id, score) in &round.scores {
                *totals.entry(*player_id).or_default() += *score;
            }
        }
        totals
    }

    /// Per-player totals and the winner. Ties go to the player seated first.
    pub fn compute_final_scores(&self) -> Result<FinalStandings, GameError> {
        let totals = self.total_scores();
        let totals: Vec<(PlayerId, Score)> = self
            .player_order
            .iter()
            .map(|id| (*id, totals.get(id).copied().unwrap_or_default()))
            .collect();
        let mut winner: Option<(PlayerId, Score)> = None;
        for (player_id, score) in &totals {
            if winner.is_none_or(|(_, best)| *score > best) {
                winner = Some((*player_id, *score));
            }
        }
        let (winner_id, _) =
            winner.ok_or_else(|| GameError::InvariantViolation("no players".to_string()))?;
        Ok(FinalStandings { totals, winner_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Rank;

    fn players(n: usize) -> Vec<PlayerId> {
        (0..n).map(|_| PlayerId::new()).collect()
    }

    fn started(n: usize, rounds: u32) -> (GameState, Vec<PlayerId>) {
        let ids = players(n);
        let mut game = GameState::new(GameRules::default(), Some(42));
        game.start_game(ids.clone(), rounds).unwrap();
        (game, ids)
    }

    fn to_playing(game: &mut GameState) {
        game.deal_round().unwrap();
        let chooser = game.current_player().unwrap();
        game.select_trump(&chooser, Suit::Spades, false).unwrap();
        while game.phase() == Phase::Bidding {
            let bidder = game.current_player().unwrap();
            game.record_bid(&bidder, 2).unwrap();
        }
    }

    fn play_out_round(game: &mut GameState) {
        while game.phase() == Phase::Playing {
            let player = game.current_player().unwrap();
            let card = game.legal_cards(&player)[0];
            game.play_card(&player, card).unwrap();
        }
    }

    #[test]
    fn test_start_game_requires_players() {
        let mut game = GameState::default();
        assert!(matches!(
            game.start_game(vec![], 5),
            Err(GameError::IllegalPhaseTransition { .. })
        ));
        assert_eq!(game.phase(), Phase::Lobby);
    }

    #[test]
    fn test_start_game_rejects_too_many_or_duplicate_players() {
        let mut game = GameState::default();
        assert_eq!(
            game.start_game(players(5), 5),
            Err(GameError::InvalidPlayerCount(5))
        );
        let id = PlayerId::new();
        assert_eq!(
            game.start_game(vec![id, id], 5),
            Err(GameError::InvalidPlayerCount(2))
        );
        assert_eq!(game.phase(), Phase::Lobby);
    }

    #[test]
    fn test_start_game_only_from_lobby() {
        let (mut game, ids) = started(4, 5);
        assert_eq!(game.phase(), Phase::Dealing);
        assert!(matches!(
            game.start_game(ids, 5),
            Err(GameError::IllegalPhaseTransition { phase: Phase::Dealing, .. })
        ));
    }

    #[test]
    fn test_deal_round_gives_13_distinct_cards_each() {
        let (mut game, ids) = started(4, 5);
        let round = game.deal_round().unwrap();
        assert_eq!(round.round_number, 1);
        assert_eq!(round.trump_chooser, ids[0]);
        let mut all: Vec<Card> = ids
            .iter()
            .flat_map(|id| game.hand(id).unwrap().to_vec())
            .collect();
        assert!(ids.iter().all(|id| game.hand(id).unwrap().len() == 13));
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 52);
        assert_eq!(game.phase(), Phase::TrumpSelection);
    }

    #[test]
    fn test_seeded_deals_are_reproducible() {
        let ids = players(3);
        let mut a = GameState::new(GameRules::default(), Some(9));
        let mut b = GameState::new(GameRules::default(), Some(9));
        a.start_game(ids.clone(), 1).unwrap();
        b.start_game(ids.clone(), 1).unwrap();
        a.deal_round().unwrap();
        b.deal_round().unwrap();
        assert_eq!(a.hand(&ids[2]), b.hand(&ids[2]));
    }

    #[test]
    fn test_only_chooser_selects_trump() {
        let (mut game, ids) = started(4, 5);
        game.deal_round().unwrap();
        assert_eq!(
            game.select_trump(&ids[1], Suit::Hearts, false),
            Err(GameError::OutOfTurn { expected: ids[0] })
        );
        assert_eq!(game.phase(), Phase::TrumpSelection);
        game.select_trump(&ids[0], Suit::Hearts, true).unwrap();
        let round = game.round().unwrap();
        assert_eq!(round.trump_suit, Some(Suit::Hearts));
        assert!(round.auto_selected);
        assert_eq!(game.phase(), Phase::Bidding);
        assert!(matches!(
            game.select_trump(&ids[0], Suit::Clubs, false),
            Err(GameError::IllegalPhaseTransition { .. })
        ));
    }

    #[test]
    fn test_bidding_rotation_starts_at_chooser() {
        let (mut game, ids) = started(4, 5);
        game.deal_round().unwrap();
        game.select_trump(&ids[0], Suit::Spades, false).unwrap();
        assert_eq!(
            game.record_bid(&ids[1], 3),
            Err(GameError::OutOfTurn { expected: ids[0] })
        );
        assert!(game.round().unwrap().bids.is_empty());
        assert_eq!(game.record_bid(&ids[0], 3), Ok(false));
        assert_eq!(game.record_bid(&ids[1], 4), Ok(false));
        assert_eq!(game.record_bid(&ids[2], 1), Ok(false));
        assert_eq!(game.record_bid(&ids[3], 2), Ok(true));
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.current_player(), Some(ids[0]));
    }

    #[test]
    fn test_bid_out_of_range() {
        let (mut game, ids) = started(2, 1);
        game.deal_round().unwrap();
        game.select_trump(&ids[0], Suit::Spades, false).unwrap();
        assert_eq!(
            game.record_bid(&ids[0], 0),
            Err(GameError::InvalidBid { amount: 0, min: 1, max: 13 })
        );
        assert_eq!(
            game.record_bid(&ids[0], 14),
            Err(GameError::InvalidBid { amount: 14, min: 1, max: 13 })
        );
        assert_eq!(game.current_player(), Some(ids[0]));
    }

    #[test]
    fn test_second_round_chooser_rotates() {
        let (mut game, ids) = started(4, 2);
        to_playing(&mut game);
        play_out_round(&mut game);
        assert_eq!(game.phase(), Phase::RoundEnd);
        game.end_round().unwrap();
        assert_eq!(game.phase(), Phase::Dealing);
        assert_eq!(game.deal_round().unwrap().trump_chooser, ids[1]);
    }

    #[test]
    fn test_card_not_in_hand() {
        let (mut game, ids) = started(4, 1);
        to_playing(&mut game);
        let missing = Suit::ALL
            .into_iter()
            .flat_map(|s| Rank::ALL.into_iter().map(move |r| Card::new(r, s)))
            .find(|c| !game.hand(&ids[0]).unwrap().contains(c))
            .unwrap();
        assert_eq!(
            game.play_card(&ids[0], missing),
            Err(GameError::InvalidCard { card: missing, reason: CardRejection::NotInHand })
        );
        assert_eq!(game.hand(&ids[0]).unwrap().len(), 13);
    }

    #[test]
    fn test_round_plays_to_completion() {
        let (mut game, ids) = started(4, 1);
        to_playing(&mut game);
        play_out_round(&mut game);
        let round = game.round().unwrap();
        assert_eq!(round.trick_history.len(), 13);
        assert_eq!(round.tricks_won.values().map(|n| *n as usize).sum::<usize>(), 13);
        assert!(ids.iter().all(|id| game.hand(id).unwrap().is_empty()));
        let scores = game.end_round().unwrap();
        assert_eq!(scores.scores.len(), 4);
        assert_eq!(game.phase(), Phase::GameEnd);
    }

    #[test]
    fn test_final_scores_sum_rounds() {
        let (mut game, ids) = started(3, 2);
        for _ in 0..2 {
            to_playing(&mut game);
            play_out_round(&mut game);
            game.end_round().unwrap();
        }
        assert_eq!(game.phase(), Phase::GameEnd);
        let standings = game.compute_final_scores().unwrap();
        for (player_id, total) in &standings.totals {
            let expected: Score = game
                .round_history()
                .iter()
                .map(|round| round.scores[player_id])
                .sum();
            assert_eq!(*total, expected);
        }
        let best = standings.totals.iter().map(|(_, s)| *s).max().unwrap();
        let first_best = standings.totals.iter().find(|(_, s)| *s == best).unwrap().0;
        assert_eq!(standings.winner_id, first_best);
        assert_eq!(standings.totals[0].0, ids[0]);
    }

    #[test]
    fn test_check_invariants_catches_lost_card() {
        let (mut game, ids) = started(4, 1);
        to_playing(&mut game);
        assert_eq!(game.check_invariants(), Ok(()));

        game.hands.get_mut(&ids[3]).unwrap().pop();
        let error = game.check_invariants().unwrap_err();
        assert!(error.is_fatal());
        assert!(matches!(error, GameError::InvariantViolation(_)));
    }

    #[test]
    fn test_check_invariants_catches_trick_count_mismatch() {
        let (mut game, ids) = started(3, 1);
        to_playing(&mut game);
        game.round.as_mut().unwrap().tricks_won.insert(ids[1], 1);
        assert!(matches!(
            game.check_invariants(),
            Err(GameError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_trick_completion_reports_violation() {
        let (mut game, ids) = started(2, 1);
        to_playing(&mut game);
        game.hands.get_mut(&ids[1]).unwrap().pop();

        let first = game.current_player().unwrap();
        let card = game.legal_cards(&first)[0];
        game.play_card(&first, card).unwrap();
        let second = game.current_player().unwrap();
        let card = game.legal_cards(&second)[0];
        let error = game.play_card(&second, card).unwrap_err();
        assert!(error.is_fatal());
    }

    #[test]
    fn test_tie_goes_to_earliest_seat() {
        let ids = players(2);
        let mut game = GameState::default();
        game.start_game(ids.clone(), 1).unwrap();
        let standings = game.compute_final_scores().unwrap();
        assert_eq!(standings.winner_id, ids[0]);
    }
}
