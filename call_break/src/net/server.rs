//! TCP transport for the host.
//!
//! Each accepted connection gets its own task. The first frame must be a
//! [`UserCommand::Join`]; after that, decoded commands are forwarded to the
//! session in order, and everything the session sends the player is written
//! back by a dedicated writer task.

use log::{debug, info, warn};
use std::{net::SocketAddr, time::Duration};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
    task::JoinSet,
    time::timeout,
};

use super::{
    errors::SerializationError,
    messages::{ServerMessage, UserCommand},
    utils::{read_prefixed, write_prefixed},
};
use crate::session::{SessionError, SessionHandle};

/// How long a fresh connection has to introduce itself.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// How long closing connections get to write their last messages.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Accepts connections until the session stops, then gives open
/// connections a moment to flush what the session last sent them.
pub async fn serve(listener: TcpListener, handle: SessionHandle) {
    if let Ok(addr) = listener.local_addr() {
        info!("listening on {addr}");
    }
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!("{addr}: accepted");
                    connections.spawn(handle_connection(stream, addr, handle.clone()));
                }
                Err(error) => warn!("accept failed: {error}"),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            () = handle.closed() => break,
        }
    }

    info!("session over, no longer accepting connections");
    drop(listener);
    let flushed = timeout(FLUSH_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if flushed.is_err() {
        debug!("dropping {} connections that didn't finish", connections.len());
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, handle: SessionHandle) {
    if let Err(error) = stream.set_nodelay(true) {
        debug!("{addr}: couldn't set TCP_NODELAY: {error}");
    }
    let (mut reader, mut writer) = stream.into_split();

    let (player_id, name) = match timeout(JOIN_TIMEOUT, read_prefixed(&mut reader)).await {
        Ok(Ok(UserCommand::Join { player_id, name })) => (player_id, name),
        Ok(Ok(command)) => {
            warn!("{addr}: expected a join, got '{command}'");
            return;
        }
        Ok(Err(error)) => {
            warn!("{addr}: failed reading join: {error}");
            return;
        }
        Err(_) => {
            warn!("{addr}: never joined");
            return;
        }
    };

    let (link, mut outbox) = mpsc::unbounded_channel::<ServerMessage>();
    let mut writer_task = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            if let Err(error) = write_prefixed(&mut writer, &message).await {
                debug!("{addr}: write failed: {error}");
                break;
            }
        }
    });

    let connection = match handle.join(player_id, name, Box::new(link)).await {
        Ok(connection) => connection,
        Err(SessionError::Rejected(code)) => {
            // The rejection was queued on the link; let it drain.
            debug!("{addr}: join rejected: {code}");
            let _ = writer_task.await;
            return;
        }
        Err(error) => {
            debug!("{addr}: {error}");
            writer_task.abort();
            return;
        }
    };
    info!("{addr}: attached as {player_id}");

    loop {
        tokio::select! {
            frame = read_prefixed::<UserCommand, _>(&mut reader) => match frame {
                Ok(UserCommand::Leave) => {
                    let _ = handle.command(player_id, connection, UserCommand::Leave).await;
                    break;
                }
                Ok(command) => {
                    if handle.command(player_id, connection, command).await.is_err() {
                        break;
                    }
                }
                Err(error) if error.is_recoverable() => {
                    warn!("{addr}: dropping malformed frame: {error}");
                }
                Err(SerializationError::Closed) => break,
                Err(error) => {
                    warn!("{addr}: {error}");
                    break;
                }
            },
            // The session dropped our link, either because we were replaced
            // or because it has ended.
            _ = &mut writer_task => break,
        }
    }

    let _ = handle.disconnect(player_id, connection).await;
    info!("{addr}: {player_id} detached");
}
