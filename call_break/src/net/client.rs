//! A low-level TCP Call Break client.
//!
//! Frames read from the host are decoded on a background task and handed
//! over through a channel, so the caller can consume them in one loop.

use anyhow::{Context, Error};
use log::warn;
use tokio::{
    net::{TcpStream, ToSocketAddrs, tcp::OwnedWriteHalf},
    sync::mpsc,
    task::JoinHandle,
};

use super::{
    errors::SerializationError,
    messages::{ServerMessage, UserCommand},
    utils::{read_prefixed, write_prefixed},
};
use crate::game::entities::{PlayerId, PlayerName};

pub struct Client {
    pub player_id: PlayerId,
    writer: OwnedWriteHalf,
    messages: mpsc::UnboundedReceiver<ServerMessage>,
    reader_task: JoinHandle<()>,
}

impl Client {
    /// Connects and joins as `player_id`. Using the id from an earlier
    /// connection rejoins that seat.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        player_id: PlayerId,
        name: PlayerName,
    ) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr)
            .await
            .context("couldn't reach the host")?;
        stream.set_nodelay(true)?;
        let (mut reader, mut writer) = stream.into_split();
        write_prefixed(&mut writer, &UserCommand::Join { player_id, name })
            .await
            .context("couldn't send join")?;

        let (tx, messages) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(async move {
            loop {
                match read_prefixed::<ServerMessage, _>(&mut reader).await {
                    Ok(message) => {
                        if tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(error) if error.is_recoverable() => {
                        warn!("dropping malformed frame: {error}");
                    }
                    Err(SerializationError::Closed) => break,
                    Err(error) => {
                        warn!("connection lost: {error}");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            player_id,
            writer,
            messages,
            reader_task,
        })
    }

    pub async fn send(&mut self, command: &UserCommand) -> Result<(), SerializationError> {
        write_prefixed(&mut self.writer, command).await
    }

    /// Next message from the host, or `None` once the connection is closed.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.messages.recv().await
    }

    /// Says goodbye and closes the connection.
    pub async fn leave(mut self) -> Result<(), SerializationError> {
        let result = self.send(&UserCommand::Leave).await;
        self.reader_task.abort();
        result
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}
