//! Opcodes for protocol 757 (Minecraft 1.18 / 1.18.1).
//!
//! Only the packets the server itself produces or consumes are listed.
//! Opcodes are scoped by connection state, so equal values in different
//! modules are not a mistake.

/// Handshaking state.
pub mod handshake {
    pub const SERVERBOUND_HANDSHAKE: i32 = 0x00;
}

/// Login state.
pub mod login {
    pub const SERVERBOUND_LOGIN_START: i32 = 0x00;

    pub const CLIENTBOUND_DISCONNECT: i32 = 0x00;
    pub const CLIENTBOUND_LOGIN_SUCCESS: i32 = 0x02;
}

/// Play state.
pub mod play {
    pub const SERVERBOUND_CHAT: i32 = 0x03;
    pub const SERVERBOUND_KEEP_ALIVE: i32 = 0x0F;

    pub const CLIENTBOUND_CHAT: i32 = 0x0F;
    pub const CLIENTBOUND_DISCONNECT: i32 = 0x1A;
    pub const CLIENTBOUND_KEEP_ALIVE: i32 = 0x21;
}

/// The protocol number sent in the handshake by 1.18 clients.
pub const PROTOCOL_VERSION: i32 = 757;
