use bincode::{
    config,
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{Serialize, de::DeserializeOwned};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::{Result, SerializationError};

/// Maximum allowed frame size (1MB) so a bogus length prefix can't force a
/// huge allocation.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let bytes = encode_to_vec(value, config::standard())?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: bytes.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(decode_from_slice(bytes, config::standard())?.0)
}

/// Reads one length-prefixed frame. A frame that arrives intact but fails to
/// decode returns [`SerializationError::Decode`], leaving the reader
/// positioned at the next frame.
pub async fn read_prefixed<T, R>(reader: &mut R) -> Result<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(SerializationError::Closed);
        }
        Err(error) => return Err(error.into()),
    }
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0; len];
    reader.read_exact(&mut buf).await?;
    decode(&buf)
}

pub async fn write_prefixed<T, W>(writer: &mut W, value: &T) -> Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let serialized = encode(value)?;
    // Size and payload go out in one write so a reader never sees a
    // prefix without its body.
    let size = serialized.len() as u32;
    let mut buf = Vec::with_capacity(4 + serialized.len());
    buf.extend(size.to_le_bytes());
    buf.extend(serialized);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncWriteExt, duplex};

    use super::*;
    use crate::game::entities::{Card, PlayerId, PlayerName, Rank, Suit};
    use crate::net::messages::UserCommand;

    #[tokio::test]
    async fn write_and_read() {
        let (mut client, mut server) = duplex(4096);
        let value = "Hello, World!".to_string();
        write_prefixed(&mut server, &value).await.unwrap();
        let received: String = read_prefixed(&mut client).await.unwrap();
        assert_eq!(received, value);
    }

    #[tokio::test]
    async fn write_and_read_commands_in_order() {
        let (mut client, mut server) = duplex(4096);
        let commands = vec![
            UserCommand::Join {
                player_id: PlayerId::new(),
                name: PlayerName::new("ana"),
            },
            UserCommand::Bid(3),
            UserCommand::PlayCard(Card::new(Rank::Queen, Suit::Clubs)),
            UserCommand::RequestSync,
        ];
        for cmd in &commands {
            write_prefixed(&mut server, cmd).await.unwrap();
        }
        for cmd in &commands {
            let received: UserCommand = read_prefixed(&mut client).await.unwrap();
            assert_eq!(&received, cmd);
        }
    }

    #[tokio::test]
    async fn reject_oversized_prefix() {
        let (mut client, mut server) = duplex(64);
        server.write_all(&2_000_000_000u32.to_le_bytes()).await.unwrap();
        assert!(matches!(
            read_prefixed::<String, _>(&mut client).await,
            Err(SerializationError::MessageTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn closed_stream_reports_closed() {
        let (mut client, server) = duplex(64);
        drop(server);
        assert!(matches!(
            read_prefixed::<String, _>(&mut client).await,
            Err(SerializationError::Closed)
        ));
    }

    #[tokio::test]
    async fn truncated_body_is_an_io_error() {
        let (mut client, mut server) = duplex(64);
        server.write_all(&10u32.to_le_bytes()).await.unwrap();
        server.write_all(&[1, 2]).await.unwrap();
        drop(server);
        assert!(matches!(
            read_prefixed::<String, _>(&mut client).await,
            Err(SerializationError::Io(_))
        ));
    }

    #[tokio::test]
    async fn malformed_frame_is_skipped() {
        let (mut client, mut server) = duplex(4096);
        // A well-framed body that isn't a valid command.
        server.write_all(&3u32.to_le_bytes()).await.unwrap();
        server.write_all(&[0xff, 0xff, 0xff]).await.unwrap();
        write_prefixed(&mut server, &UserCommand::RequestSync).await.unwrap();

        let err = read_prefixed::<UserCommand, _>(&mut client).await.unwrap_err();
        assert!(err.is_recoverable());
        let next: UserCommand = read_prefixed(&mut client).await.unwrap();
        assert_eq!(next, UserCommand::RequestSync);
    }

    #[test]
    fn encode_rejects_oversized_values() {
        let large = "x".repeat(MAX_MESSAGE_SIZE + 1);
        assert!(matches!(
            encode(&large),
            Err(SerializationError::MessageTooLarge { .. })
        ));
    }
}
