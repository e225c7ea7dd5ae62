//! Client-side synchronizer.
//!
//! [`ClientSync`] applies the host's ordered message stream to a local
//! [`Projection`] and turns player intents into [`UserCommand`]s after
//! checking them against that projection.

mod handlers;
pub mod projection;

use log::{debug, warn};
use thiserror::Error;

pub use projection::{FinalResult, Projection, Prompt};

use crate::{
    game::entities::{Card, PlayerId, Suit},
    net::{
        messages::{ServerMessage, UserCommand},
        utils,
    },
};

/// Intents refused locally, before reaching the host.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum ClientError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("bid must be between {min} and {max}")]
    BidOutOfRange { min: u8, max: u8 },
    #[error("{0} is not in your hand")]
    NotInHand(Card),
    #[error("{0} can't be played now")]
    IllegalCard(Card),
    #[error("{0} is not on offer")]
    UnavailableSuit(Suit),
}

#[derive(Debug)]
pub struct ClientSync {
    projection: Projection,
}

impl ClientSync {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            projection: Projection::new(player_id),
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn player_id(&self) -> PlayerId {
        self.projection.player_id
    }

    /// Applies one host message. The recorded round number only ever moves
    /// forward; everything else in the message is applied regardless.
    pub fn apply(&mut self, message: ServerMessage) {
        debug!("applying {message}");
        if message.round_number < self.projection.round_number {
            debug!(
                "message from round {} arrived during round {}",
                message.round_number, self.projection.round_number
            );
        }
        handlers::apply_payload(&mut self.projection, message.payload);
        self.projection.round_number = self.projection.round_number.max(message.round_number);
        self.projection.phase = message.phase;
    }

    /// Decodes and applies a raw frame body. Malformed input is logged and
    /// dropped; returns whether anything was applied.
    pub fn apply_encoded(&mut self, bytes: &[u8]) -> bool {
        match utils::decode::<ServerMessage>(bytes) {
            Ok(message) => {
                self.apply(message);
                true
            }
            Err(error) => {
                warn!("dropping malformed message: {error}");
                false
            }
        }
    }

    pub fn choose_trump(&self, suit: Suit) -> Result<UserCommand, ClientError> {
        match &self.projection.prompt {
            Some(Prompt::ChooseTrump {
                available_suits, ..
            }) => {
                if available_suits.contains(&suit) {
                    Ok(UserCommand::ChooseTrump(suit))
                } else {
                    Err(ClientError::UnavailableSuit(suit))
                }
            }
            _ => Err(ClientError::NotYourTurn),
        }
    }

    pub fn submit_bid(&self, amount: u8) -> Result<UserCommand, ClientError> {
        match &self.projection.prompt {
            Some(Prompt::Bid {
                min_bid, max_bid, ..
            }) => {
                if (*min_bid..=*max_bid).contains(&amount) {
                    Ok(UserCommand::Bid(amount))
                } else {
                    Err(ClientError::BidOutOfRange {
                        min: *min_bid,
                        max: *max_bid,
                    })
                }
            }
            _ => Err(ClientError::NotYourTurn),
        }
    }

    pub fn play_card(&self, card: Card) -> Result<UserCommand, ClientError> {
        if !self.projection.hand.contains(&card) {
            return Err(ClientError::NotInHand(card));
        }
        match &self.projection.prompt {
            Some(Prompt::Play { valid_cards, .. }) => {
                if valid_cards.contains(&card) {
                    Ok(UserCommand::PlayCard(card))
                } else {
                    Err(ClientError::IllegalCard(card))
                }
            }
            _ => Err(ClientError::NotYourTurn),
        }
    }

    pub fn request_sync(&self) -> UserCommand {
        UserCommand::RequestSync
    }
}
