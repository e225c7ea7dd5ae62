use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    game::{
        Phase,
        entities::{Card, Play, PlayerId, PlayerInfo, PlayerName, Score, Suit},
    },
    net::messages::ErrorCode,
};

/// What the host is currently asking this player to do.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Prompt {
    ChooseTrump {
        available_suits: Vec<Suit>,
        timeout_seconds: u64,
    },
    Bid {
        min_bid: u8,
        max_bid: u8,
        timeout_seconds: Option<u64>,
    },
    Play {
        valid_cards: Vec<Card>,
        timeout_seconds: Option<u64>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FinalResult {
    pub final_scores: Vec<(PlayerId, Score)>,
    pub winner_id: PlayerId,
}

/// The controlling player's local view of the game.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Projection {
    pub player_id: PlayerId,
    pub round_number: u32,
    pub total_rounds: u32,
    pub phase: Phase,
    /// Seating order once the game starts, join order before.
    pub players: Vec<PlayerInfo>,
    pub max_players: usize,
    pub trump_suit: Option<Suit>,
    pub trump_chooser: Option<PlayerId>,
    pub trump_auto_selected: bool,
    pub hand: Vec<Card>,
    pub bids: BTreeMap<PlayerId, u8>,
    pub tricks_won: BTreeMap<PlayerId, u8>,
    pub current_trick: Vec<Play>,
    pub last_trick: Option<(PlayerId, Vec<Play>)>,
    pub current_turn: Option<PlayerId>,
    pub prompt: Option<Prompt>,
    pub round_scores: BTreeMap<PlayerId, Score>,
    pub total_scores: BTreeMap<PlayerId, Score>,
    pub final_result: Option<FinalResult>,
    pub disconnected: BTreeSet<PlayerId>,
    pub last_error: Option<(ErrorCode, String)>,
}

impl Projection {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            round_number: 0,
            total_rounds: 0,
            phase: Phase::Lobby,
            players: Vec::new(),
            max_players: 0,
            trump_suit: None,
            trump_chooser: None,
            trump_auto_selected: false,
            hand: Vec::new(),
            bids: BTreeMap::new(),
            tricks_won: BTreeMap::new(),
            current_trick: Vec::new(),
            last_trick: None,
            current_turn: None,
            prompt: None,
            round_scores: BTreeMap::new(),
            total_scores: BTreeMap::new(),
            final_result: None,
            disconnected: BTreeSet::new(),
            last_error: None,
        }
    }

    pub fn name_of(&self, player_id: &PlayerId) -> Option<&PlayerName> {
        self.players
            .iter()
            .find(|info| info.id == *player_id)
            .map(|info| &info.name)
    }

    pub fn is_my_turn(&self) -> bool {
        self.current_turn == Some(self.player_id)
    }

    /// Clears everything scoped to a single round.
    pub(super) fn reset_round(&mut self) {
        self.trump_suit = None;
        self.trump_chooser = None;
        self.trump_auto_selected = false;
        self.hand.clear();
        self.bids.clear();
        self.tricks_won = self.players.iter().map(|info| (info.id, 0)).collect();
        self.current_trick.clear();
        self.last_trick = None;
        self.current_turn = None;
        self.prompt = None;
        self.round_scores.clear();
    }

    pub(super) fn set_connected(&mut self, player_id: PlayerId, connected: bool) {
        if connected {
            self.disconnected.remove(&player_id);
        } else {
            self.disconnected.insert(player_id);
        }
        if let Some(info) = self.players.iter_mut().find(|info| info.id == player_id) {
            info.connected = connected;
        }
    }
}
