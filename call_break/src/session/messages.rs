//! Session actor message types.

use thiserror::Error;
use tokio::sync::oneshot;

use super::roster::{ConnectionId, PlayerLink};
use crate::{
    game::{
        GameError,
        entities::{PlayerId, PlayerName},
    },
    net::messages::{ErrorCode, UserCommand},
};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,
    #[error("join rejected: {0}")]
    Rejected(ErrorCode),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Messages that can be sent to a `SessionActor`
pub enum SessionMessage {
    /// A connection presented a player id. Joins the lobby, or reattaches a
    /// disconnected seat during a game.
    Join {
        player_id: PlayerId,
        name: PlayerName,
        link: Box<dyn PlayerLink>,
        response: oneshot::Sender<Result<ConnectionId, ErrorCode>>,
    },

    /// A player intent from an attached connection
    Command {
        player_id: PlayerId,
        connection: ConnectionId,
        command: UserCommand,
    },

    /// The connection went away. Ignored if the seat has since been
    /// reattached to a newer connection.
    Disconnect {
        player_id: PlayerId,
        connection: ConnectionId,
    },

    /// Start before the lobby is full
    StartGame {
        response: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Stop the session
    Close,
}

impl std::fmt::Debug for SessionMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Join {
                player_id, name, ..
            } => f
                .debug_struct("Join")
                .field("player_id", player_id)
                .field("name", name)
                .finish_non_exhaustive(),
            Self::Command {
                player_id,
                connection,
                command,
            } => f
                .debug_struct("Command")
                .field("player_id", player_id)
                .field("connection", connection)
                .field("command", command)
                .finish(),
            Self::Disconnect {
                player_id,
                connection,
            } => f
                .debug_struct("Disconnect")
                .field("player_id", player_id)
                .field("connection", connection)
                .finish(),
            Self::StartGame { .. } => f.write_str("StartGame"),
            Self::Close => f.write_str("Close"),
        }
    }
}
