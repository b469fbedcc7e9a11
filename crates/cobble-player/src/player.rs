//! The player handle shared by every task serving one connection.

use std::fmt;

use cobble_packet::{Decode, Encode, Packet, PacketError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ErrorCell, PacketQueue, PlayerError};

/// A clientbound packet laid out for protocol 757 (Minecraft 1.18).
///
/// Handlers build these instead of bare [`Packet`]s so their signatures
/// say which protocol version they were written against; moving to a new
/// version means touching every place that produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet757(pub Packet);

impl From<Packet> for Packet757 {
    fn from(packet: Packet) -> Self {
        Self(packet)
    }
}

impl From<Packet757> for Packet {
    fn from(packet: Packet757) -> Self {
        packet.0
    }
}

/// The player's game mode, one unsigned byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gamemode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl Gamemode {
    /// Wire value of this mode.
    pub fn id(self) -> u8 {
        match self {
            Self::Survival => 0,
            Self::Creative => 1,
            Self::Adventure => 2,
            Self::Spectator => 3,
        }
    }

    /// Parses a wire value.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Survival),
            1 => Some(Self::Creative),
            2 => Some(Self::Adventure),
            3 => Some(Self::Spectator),
            _ => None,
        }
    }
}

impl Encode for Gamemode {
    fn write_to<W: std::io::Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        self.id().write_to(w)
    }
}

impl Decode for Gamemode {
    fn read_from<R: std::io::Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut id = 0u8;
        let n = id.read_from(r)?;
        *self = Self::from_id(id).ok_or_else(|| {
            PacketError::invalid("gamemode", format!("unknown game mode {id}")).after(n)
        })?;
        Ok(n)
    }
}

/// A logged-in player.
///
/// Shared as `Arc<Player>` between the connection's reader and writer
/// tasks, the chat actor, and any handler holding on to it. The identity
/// fields never change after login.
pub struct Player {
    /// Player UUID; offline-mode servers generate a random one.
    pub uuid: Uuid,
    /// Name sent in Login Start.
    pub name: String,
    /// Entity id assigned by the server.
    pub entity_id: i32,
    pub gamemode: Gamemode,

    queue: PacketQueue,
    errors: ErrorCell<PlayerError>,
}

impl Player {
    /// Creates a player with an open queue and an empty error cell.
    pub fn new(uuid: Uuid, name: impl Into<String>, entity_id: i32, gamemode: Gamemode) -> Self {
        Self {
            uuid,
            name: name.into(),
            entity_id,
            gamemode,
            queue: PacketQueue::new(),
            errors: ErrorCell::new(),
        }
    }

    /// Queues a packet for delivery to this player's client.
    ///
    /// Returns immediately; the connection's writer task sends it later.
    /// Packets written after the connection closed are dropped.
    pub fn write_packet(&self, packet: Packet757) {
        self.queue.push(packet.0);
    }

    /// The outbound queue drained by the connection's writer task.
    pub fn queue(&self) -> &PacketQueue {
        &self.queue
    }

    /// Reports an error that must end this player's connection.
    ///
    /// Only the first error is kept; later ones are logged and dropped.
    pub fn put_err(&self, err: PlayerError) {
        let text = err.to_string();
        if !self.errors.put(err) {
            tracing::debug!(player = %self, error = %text, "error dropped, one already pending");
        }
    }

    /// Takes the pending error, if any, without waiting.
    pub fn take_err(&self) -> Option<PlayerError> {
        self.errors.take()
    }

    /// Resolves once an error has been reported.
    pub async fn failed(&self) {
        self.errors.failed().await;
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uuid)
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .field("entity_id", &self.entity_id)
            .field("gamemode", &self.gamemode)
            .finish_non_exhaustive()
    }
}
