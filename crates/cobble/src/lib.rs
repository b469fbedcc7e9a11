//! # Cobble
//!
//! A small server for the Minecraft Java Edition protocol 757 (1.18),
//! built around a global chat.
//!
//! Cobble accepts connections, runs the offline-mode login, and hands each
//! player to a set of [`Component`]s. Packets from the client are routed by
//! opcode through a [`HandlerRegistry`]; packets to the client go through
//! the player's queue and a dedicated writer task.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cobble::prelude::*;
//!
//! # async fn start() -> Result<(), CobbleError> {
//! let server = Server::builder()
//!     .bind("0.0.0.0:25565")
//!     .with_global_chat()
//!     .build()
//!     .await?;
//! server.run(CancellationToken::new()).await
//! # }
//! ```

mod chat_component;
mod component;
mod config;
mod connection;
mod error;
mod handler;
mod server;

pub use component::Component;
pub use config::ServerConfig;
pub use error::CobbleError;
pub use handler::HandlerRegistry;
pub use server::{Server, ServerBuilder};

/// Re-exports of the sub-crates.
pub use cobble_chat as chat;
pub use cobble_packet as packet;
pub use cobble_player as player;
pub use cobble_transport as transport;

/// Everything needed to build a server and write handlers.
pub mod prelude {
    pub use crate::{CobbleError, Component, HandlerRegistry, Server, ServerBuilder, ServerConfig};
    pub use cobble_chat::{
        strip_control_sequences, ChatPosition, Color, GlobalChat, Message,
    };
    pub use cobble_packet::packetid;
    pub use cobble_packet::{Ary, Decode, Encode, Opt, Packet, PacketError, VarInt, VarLong};
    pub use cobble_player::{Gamemode, Packet757, Player, PlayerError};
    pub use tokio_util::sync::CancellationToken;
}
