//! Seats and the connections attached to them.

use log::debug;
use tokio::sync::mpsc;

use crate::{
    game::entities::{PlayerId, PlayerInfo, PlayerName},
    net::messages::{ErrorCode, ServerMessage},
};

/// Identifies one attachment of a connection to a seat. A seat that is
/// reattached gets a fresh id, so late events from the old connection can
/// be told apart.
pub type ConnectionId = u64;

/// Outbound half of a player's connection, as seen by the session.
pub trait PlayerLink: Send {
    /// Queues a message for the player. Returns false if the peer is gone.
    fn send(&self, message: ServerMessage) -> bool;
}

impl PlayerLink for mpsc::UnboundedSender<ServerMessage> {
    fn send(&self, message: ServerMessage) -> bool {
        mpsc::UnboundedSender::send(self, message).is_ok()
    }
}

pub struct Seat {
    pub id: PlayerId,
    pub name: PlayerName,
    link: Option<Box<dyn PlayerLink>>,
    connection: ConnectionId,
}

impl Seat {
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            connected: self.is_connected(),
        }
    }
}

/// Seats in join order, which becomes the play order.
pub struct Roster {
    seats: Vec<Seat>,
    capacity: usize,
    next_connection: ConnectionId,
}

impl Roster {
    pub fn new(capacity: usize) -> Self {
        Self {
            seats: Vec::with_capacity(capacity),
            capacity,
            next_connection: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= self.capacity
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.id == *player_id)
    }

    pub fn name(&self, player_id: &PlayerId) -> Option<&PlayerName> {
        self.get(player_id).map(|seat| &seat.name)
    }

    pub fn is_connected(&self, player_id: &PlayerId) -> bool {
        self.get(player_id).is_some_and(Seat::is_connected)
    }

    /// True if `connection` is the one currently attached to the seat.
    pub fn is_current(&self, player_id: &PlayerId, connection: ConnectionId) -> bool {
        self.get(player_id)
            .is_some_and(|seat| seat.is_connected() && seat.connection == connection)
    }

    pub fn connected_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.is_connected()).count()
    }

    pub fn order(&self) -> Vec<PlayerId> {
        self.seats.iter().map(|seat| seat.id).collect()
    }

    pub fn player_info(&self) -> Vec<PlayerInfo> {
        self.seats.iter().map(Seat::info).collect()
    }

    fn next_connection(&mut self) -> ConnectionId {
        let id = self.next_connection;
        self.next_connection += 1;
        id
    }

    pub fn check_add(&self, id: &PlayerId) -> Result<(), ErrorCode> {
        if self.get(id).is_some() {
            return Err(ErrorCode::AlreadyConnected);
        }
        if self.is_full() {
            return Err(ErrorCode::LobbyFull);
        }
        Ok(())
    }

    pub fn check_reattach(&self, id: &PlayerId) -> Result<(), ErrorCode> {
        match self.get(id) {
            None => Err(ErrorCode::GameInProgress),
            Some(seat) if seat.is_connected() => Err(ErrorCode::AlreadyConnected),
            Some(_) => Ok(()),
        }
    }

    /// Takes a new seat.
    pub fn add(
        &mut self,
        id: PlayerId,
        name: PlayerName,
        link: Box<dyn PlayerLink>,
    ) -> Result<ConnectionId, ErrorCode> {
        self.check_add(&id)?;
        let connection = self.next_connection();
        self.seats.push(Seat {
            id,
            name,
            link: Some(link),
            connection,
        });
        Ok(connection)
    }

    /// Attaches a new connection to a disconnected seat.
    pub fn reattach(
        &mut self,
        id: &PlayerId,
        link: Box<dyn PlayerLink>,
    ) -> Result<ConnectionId, ErrorCode> {
        self.check_reattach(id)?;
        let connection = self.next_connection();
        let seat = self
            .seats
            .iter_mut()
            .find(|seat| seat.id == *id)
            .ok_or(ErrorCode::GameInProgress)?;
        seat.link = Some(link);
        seat.connection = connection;
        Ok(connection)
    }

    /// Drops the seat's link if `connection` is still the current one.
    /// Returns whether anything changed.
    pub fn detach(&mut self, id: &PlayerId, connection: ConnectionId) -> bool {
        match self.seats.iter_mut().find(|seat| seat.id == *id) {
            Some(seat) if seat.is_connected() && seat.connection == connection => {
                seat.link = None;
                true
            }
            _ => false,
        }
    }

    /// Frees the seat entirely, only while the current connection holds it.
    pub fn remove(&mut self, id: &PlayerId, connection: ConnectionId) -> bool {
        let before = self.seats.len();
        self.seats
            .retain(|seat| !(seat.id == *id && seat.connection == connection));
        self.seats.len() != before
    }

    pub fn send_to(&self, id: &PlayerId, message: ServerMessage) -> bool {
        let Some(link) = self.get(id).and_then(|seat| seat.link.as_ref()) else {
            return false;
        };
        let sent = link.send(message);
        if !sent {
            debug!("{id}: link closed, message dropped");
        }
        sent
    }

    pub fn broadcast(&self, message: &ServerMessage) {
        for seat in &self.seats {
            if let Some(link) = &seat.link {
                if !link.send(message.clone()) {
                    debug!("{}: link closed, broadcast dropped", seat.id);
                }
            }
        }
    }
}
