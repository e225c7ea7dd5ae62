use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::game::{
    GameError, Phase,
    entities::{Card, Play, PlayerId, PlayerInfo, PlayerName, RoundScores, Score, Suit},
};

/// Reason codes sent to a client whose message was rejected.
#[derive(Clone, Copy, Debug, Deserialize, Eq, thiserror::Error, PartialEq, Serialize)]
pub enum ErrorCode {
    #[error("not allowed in the current phase")]
    IllegalPhase,
    #[error("not your turn")]
    OutOfTurn,
    #[error("invalid bid")]
    InvalidBid,
    #[error("invalid card")]
    InvalidCard,
    #[error("not part of this game")]
    UnknownPlayer,
    #[error("lobby is full")]
    LobbyFull,
    #[error("game already in progress")]
    GameInProgress,
    #[error("already connected")]
    AlreadyConnected,
    #[error("join first")]
    NotJoined,
    #[error("malformed message")]
    Protocol,
    #[error("session aborted")]
    SessionAborted,
    #[error("session closed")]
    SessionClosed,
}

impl From<&GameError> for ErrorCode {
    fn from(value: &GameError) -> Self {
        match value {
            GameError::IllegalPhaseTransition { .. } => Self::IllegalPhase,
            GameError::OutOfTurn { .. } => Self::OutOfTurn,
            GameError::InvalidBid { .. } => Self::InvalidBid,
            GameError::InvalidCard { .. } => Self::InvalidCard,
            GameError::UnknownPlayer(_) => Self::UnknownPlayer,
            GameError::InvalidPlayerCount(_) => Self::IllegalPhase,
            GameError::InvariantViolation(_) => Self::SessionAborted,
        }
    }
}

/// Everything a reconnecting player needs to rebuild their view.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Snapshot {
    pub round_number: u32,
    pub total_rounds: u32,
    pub phase: Phase,
    /// Seating order.
    pub players: Vec<PlayerInfo>,
    pub trump_suit: Option<Suit>,
    pub trump_chooser: Option<PlayerId>,
    /// The recipient's own hand.
    pub hand: Vec<Card>,
    pub current_trick: Vec<Play>,
    pub bids: BTreeMap<PlayerId, u8>,
    pub tricks_won: BTreeMap<PlayerId, u8>,
    pub current_turn: Option<PlayerId>,
    pub total_scores: BTreeMap<PlayerId, Score>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Payload {
    LobbyUpdate {
        players: Vec<PlayerInfo>,
        max_players: usize,
    },
    GameStart {
        player_order: Vec<PlayerInfo>,
        num_rounds: u32,
    },
    RoundStart {
        round_number: u32,
        total_rounds: u32,
    },
    CardsDealt {
        cards: Vec<Card>,
        round_number: u32,
    },
    TrumpChooserSelected {
        player_id: PlayerId,
        player_name: PlayerName,
    },
    TrumpSelectionRequest {
        available_suits: Vec<Suit>,
        timeout_seconds: u64,
    },
    TrumpSelected {
        trump_suit: Suit,
        chooser_name: PlayerName,
        auto_selected: bool,
        round_number: u32,
    },
    BidTurn {
        min_bid: u8,
        max_bid: u8,
        timeout_seconds: Option<u64>,
    },
    BiddingStatus {
        current_bidder: PlayerId,
        bids_so_far: BTreeMap<PlayerId, u8>,
        total_players: usize,
    },
    BidMade {
        player_id: PlayerId,
        amount: u8,
        auto_selected: bool,
    },
    BiddingComplete {
        all_bids: BTreeMap<PlayerId, u8>,
    },
    PlayTurn {
        valid_cards: Vec<Card>,
        timeout_seconds: Option<u64>,
    },
    PlayingStatus {
        current_player: PlayerId,
        trick_size: usize,
    },
    CardPlayed {
        player_id: PlayerId,
        card: Card,
        /// The whole trick so far, including this card.
        trick_cards: Vec<Play>,
        auto_played: bool,
    },
    TrickWon {
        winner_id: PlayerId,
        cards: Vec<Play>,
        /// Every player's trick count after this trick.
        tricks_won_count: BTreeMap<PlayerId, u8>,
    },
    RoundEnd {
        round_number: u32,
        scores: BTreeMap<PlayerId, Score>,
        total_scores: BTreeMap<PlayerId, Score>,
        tricks_won: BTreeMap<PlayerId, u8>,
        bids: BTreeMap<PlayerId, u8>,
    },
    GameEnd {
        /// Totals in seating order.
        final_scores: Vec<(PlayerId, Score)>,
        winner_id: PlayerId,
        all_round_scores: Vec<RoundScores>,
    },
    PlayerDisconnect {
        player_id: PlayerId,
    },
    PlayerReconnect {
        player_id: PlayerId,
    },
    StateSyncSnapshot(Box<Snapshot>),
    Error {
        code: ErrorCode,
        reason: String,
    },
}

impl Payload {
    /// Protocol name of the message kind, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LobbyUpdate { .. } => "LOBBY_UPDATE",
            Self::GameStart { .. } => "GAME_START",
            Self::RoundStart { .. } => "ROUND_START",
            Self::CardsDealt { .. } => "CARDS_DEALT",
            Self::TrumpChooserSelected { .. } => "TRUMP_CHOOSER_SELECTED",
            Self::TrumpSelectionRequest { .. } => "TRUMP_SELECTION_REQUEST",
            Self::TrumpSelected { .. } => "TRUMP_SELECTED",
            Self::BidTurn { .. } => "BID_TURN",
            Self::BiddingStatus { .. } => "BIDDING_STATUS",
            Self::BidMade { .. } => "BID_MADE",
            Self::BiddingComplete { .. } => "BIDDING_COMPLETE",
            Self::PlayTurn { .. } => "PLAY_TURN",
            Self::PlayingStatus { .. } => "PLAYING_STATUS",
            Self::CardPlayed { .. } => "CARD_PLAYED",
            Self::TrickWon { .. } => "TRICK_WON",
            Self::RoundEnd { .. } => "ROUND_END",
            Self::GameEnd { .. } => "GAME_END",
            Self::PlayerDisconnect { .. } => "PLAYER_DISCONNECT",
            Self::PlayerReconnect { .. } => "PLAYER_RECONNECT",
            Self::StateSyncSnapshot(_) => "STATE_SYNC_SNAPSHOT",
            Self::Error { .. } => "ERROR",
        }
    }
}

/// A message from the host to a client. Every message is stamped with the
/// round and phase the host was in when it was sent.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ServerMessage {
    pub round_number: u32,
    pub phase: Phase,
    pub payload: Payload,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (round {}, {})",
            self.payload.kind(),
            self.round_number,
            self.phase
        )
    }
}

/// A player intent sent from a client to the host.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum UserCommand {
    /// First message on every connection. Reusing a previous id rejoins
    /// that seat.
    Join {
        player_id: PlayerId,
        name: PlayerName,
    },
    ChooseTrump(Suit),
    Bid(u8),
    PlayCard(Card),
    /// Ask for a fresh state snapshot.
    RequestSync,
    /// Courtesy notice before closing the connection.
    Leave,
}

impl fmt::Display for UserCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join { name, .. } => write!(f, "{name} joined"),
            Self::ChooseTrump(suit) => write!(f, "chose {} as trump", suit.name()),
            Self::Bid(amount) => write!(f, "bid {amount}"),
            Self::PlayCard(card) => write!(f, "played {card}"),
            Self::RequestSync => write!(f, "requested a sync"),
            Self::Leave => write!(f, "left"),
        }
    }
}
