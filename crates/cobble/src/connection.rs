//! Per-connection lifecycle: login, play loop, teardown.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!   1. Transport handshake (the WebSocket upgrade), then the protocol
//!      Handshake → must ask for the login state
//!   2. Login Start → offline-mode UUID, entity id, Login Success
//!   3. Components learn about the player; a writer task starts draining
//!      the player's queue
//!   4. Play loop: inbound packets → handlers, keep-alive, error cell
//!   5. Components forget the player, queue closes, writer is joined
//!
//! Steps 1 and 2 run under `login_timeout` and stop early on shutdown.

use std::sync::Arc;
use std::time::Duration;

use cobble_chat::{Color, Message};
use cobble_packet::packetid::{handshake, login, play, PROTOCOL_VERSION};
use cobble_packet::{Packet, VarInt};
use cobble_player::{Packet757, Player, PlayerError, WritePacketError};
use cobble_transport::{Connection, TransportError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::server::ServerState;
use crate::CobbleError;

/// Longest name accepted in Login Start.
const MAX_NAME_LEN: usize = 16;

/// Handshake "next state" value asking for login.
const NEXT_STATE_LOGIN: i32 = 2;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: C,
    state: Arc<ServerState>,
    cancel: CancellationToken,
) -> Result<(), CobbleError>
where
    C: Connection<Error = TransportError>,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = ?conn.peer_addr(), "handling new connection");

    let login = tokio::time::timeout(state.config.login_timeout, perform_login(&*conn, &state));
    let outcome = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(%conn_id, "shutdown during login");
            let _ = conn.close().await;
            return Ok(());
        }
        outcome = login => outcome,
    };
    let player = match outcome {
        Ok(Ok(Some(player))) => Arc::new(player),
        Ok(Ok(None)) => {
            tracing::debug!(%conn_id, "closed before login");
            return Ok(());
        }
        Ok(Err(e)) => {
            let _ = conn.close().await;
            return Err(e);
        }
        Err(_) => {
            let _ = conn.close().await;
            return Err(CobbleError::Login("login timed out".into()));
        }
    };

    tracing::info!(%conn_id, player = %player, entity_id = player.entity_id, "player logged in");

    for component in &state.components {
        component.add_player(Arc::clone(&player)).await;
    }

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&player)));

    let shutdown = play_loop(&*conn, &player, &state, &cancel).await;

    for component in &state.components {
        component.remove_player(Arc::clone(&player)).await;
    }
    player.queue().close();
    if let Err(e) = writer.await {
        tracing::warn!(player = %player, error = %e, "writer task panicked");
    }

    let error = player.take_err();
    let reason = match (&error, shutdown) {
        (_, true) => Some(Message::translate("multiplayer.disconnect.server_shutdown", [])),
        (Some(PlayerError::KeepAliveTimeout), _) => {
            Some(Message::translate("disconnect.timeout", []))
        }
        (Some(PlayerError::Packet(e)), _) => Some(Message::text(format!("Malformed packet: {e}"))),
        (Some(PlayerError::Handler(reason)), _) => Some(Message::text(reason.as_str())),
        // The connection itself failed; nothing can be sent.
        _ => None,
    };
    if let Some(reason) = reason {
        send_disconnect(&*conn, play::CLIENTBOUND_DISCONNECT, reason).await;
    }
    let _ = conn.close().await;

    match error {
        Some(e) => {
            tracing::info!(player = %player, error = %e, "player disconnected");
            Err(e.into())
        }
        None => {
            tracing::info!(player = %player, "player disconnected");
            Ok(())
        }
    }
}

/// Runs the handshake and login states.
///
/// Returns `Ok(None)` if the client hung up or only wanted the status
/// state, which is not served.
async fn perform_login<C>(conn: &C, state: &ServerState) -> Result<Option<Player>, CobbleError>
where
    C: Connection<Error = TransportError>,
{
    conn.ready().await?;

    // --- Handshake ---
    let Some(packet) = conn.recv().await? else {
        return Ok(None);
    };
    if packet.id != handshake::SERVERBOUND_HANDSHAKE {
        return Err(CobbleError::Login(format!(
            "expected handshake, got packet {:#04x}",
            packet.id
        )));
    }
    let mut protocol = VarInt(0);
    let mut address = String::new();
    let mut port = 0u16;
    let mut next_state = VarInt(0);
    packet.scan((&mut protocol, &mut address, &mut port, &mut next_state))?;

    if next_state.0 != NEXT_STATE_LOGIN {
        tracing::debug!(next_state = next_state.0, "client did not ask for login");
        return Ok(None);
    }

    // --- Login Start ---
    let Some(packet) = conn.recv().await? else {
        return Ok(None);
    };
    if packet.id != login::SERVERBOUND_LOGIN_START {
        return Err(CobbleError::Login(format!(
            "expected login start, got packet {:#04x}",
            packet.id
        )));
    }
    let mut name = String::new();
    packet.scan(&mut name)?;

    if protocol.0 != PROTOCOL_VERSION {
        let key = if protocol.0 < PROTOCOL_VERSION {
            "multiplayer.disconnect.outdated_client"
        } else {
            "multiplayer.disconnect.outdated_server"
        };
        let reason = Message::translate(key, [Message::text("1.18.1")]);
        send_disconnect(conn, login::CLIENTBOUND_DISCONNECT, reason).await;
        return Err(CobbleError::Login(format!(
            "{name} uses protocol {}, expected {PROTOCOL_VERSION}",
            protocol.0
        )));
    }

    if !valid_name(&name) {
        let reason = Message::translate("multiplayer.disconnect.invalid_player_data", [])
            .with_color(Color::Red);
        send_disconnect(conn, login::CLIENTBOUND_DISCONNECT, reason).await;
        return Err(CobbleError::Login(format!("invalid player name {name:?}")));
    }

    // Offline mode: no session server to ask, so the identity is random.
    let uuid = Uuid::new_v4();
    conn.send(&Packet::marshal(
        login::CLIENTBOUND_LOGIN_SUCCESS,
        (uuid, name.as_str()),
    )?)
    .await?;

    let entity_id = state.next_entity_id();
    tracing::debug!(%address, port, %name, "login accepted");
    Ok(Some(Player::new(uuid, name, entity_id, state.config.default_gamemode)))
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reads inbound packets until the player fails, the client leaves, or the
/// server shuts down. Returns `true` in the last case.
async fn play_loop<C>(
    conn: &C,
    player: &Arc<Player>,
    state: &ServerState,
    cancel: &CancellationToken,
) -> bool
where
    C: Connection<Error = TransportError>,
{
    // `interval_at` panics on a zero period.
    let interval = state.config.keep_alive_interval.max(Duration::from_millis(10));
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut keep_alive = KeepAlive::new(state.config.keep_alive_timeout);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return true,
            _ = player.failed() => return false,
            _ = ticker.tick() => {
                if keep_alive.expired() {
                    player.put_err(PlayerError::KeepAliveTimeout);
                } else if let Some(id) = keep_alive.start() {
                    match Packet::marshal(play::CLIENTBOUND_KEEP_ALIVE, id) {
                        Ok(packet) => player.write_packet(Packet757(packet)),
                        Err(e) => player.put_err(e.into()),
                    }
                }
            }
            received = conn.recv() => match received {
                Ok(Some(packet)) if packet.id == play::SERVERBOUND_KEEP_ALIVE => {
                    let mut id = 0i64;
                    match packet.scan(&mut id) {
                        Ok(_) if keep_alive.answer(id) => {}
                        Ok(_) => player.put_err(PlayerError::KeepAliveTimeout),
                        Err(e) => player.put_err(e.into()),
                    }
                }
                Ok(Some(packet)) => {
                    if let Err(e) = state.handlers.dispatch(player, Packet757(packet)).await {
                        player.put_err(e);
                    }
                }
                Ok(None) => return false,
                Err(e) => player.put_err(e.into()),
            },
        }
    }
}

/// Drains the player's queue onto the connection.
async fn write_loop<C>(conn: Arc<C>, player: Arc<Player>)
where
    C: Connection<Error = TransportError>,
{
    while let Some(packet) = player.queue().pull().await {
        if let Err(source) = conn.send(&packet).await {
            player.put_err(WritePacketError { id: packet.id, source }.into());
            break;
        }
    }
}

async fn send_disconnect<C>(conn: &C, id: i32, reason: Message)
where
    C: Connection<Error = TransportError>,
{
    let packet = match Packet::marshal(id, &reason) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::debug!(error = %e, "failed to encode disconnect");
            return;
        }
    };
    if let Err(e) = conn.send(&packet).await {
        tracing::debug!(error = %e, "failed to send disconnect");
    }
}

/// Tracks the one outstanding keep-alive a connection may have.
#[derive(Debug)]
struct KeepAlive {
    timeout: Duration,
    pending: Option<(i64, Instant)>,
}

impl KeepAlive {
    fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: None,
        }
    }

    /// Picks a fresh id to send, unless one is still unanswered.
    fn start(&mut self) -> Option<i64> {
        if self.pending.is_some() {
            return None;
        }
        let id = rand::random::<i64>();
        self.pending = Some((id, Instant::now()));
        Some(id)
    }

    /// Records a reply. Returns `false` if it does not match the
    /// outstanding id.
    fn answer(&mut self, id: i64) -> bool {
        match self.pending {
            Some((expected, _)) if expected == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    fn expired(&self) -> bool {
        self.pending
            .is_some_and(|(_, sent)| sent.elapsed() >= self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_name() {
        assert!(valid_name("Notch"));
        assert!(valid_name("a_b_c_1234567890"));
        assert!(!valid_name(""));
        assert!(!valid_name("seventeen_chars__"));
        assert!(!valid_name("has space"));
    }

    #[test]
    fn test_keep_alive_round() {
        let mut ka = KeepAlive::new(Duration::from_secs(30));
        let id = ka.start().expect("nothing pending");
        assert!(ka.start().is_none());
        assert!(!ka.answer(id.wrapping_add(1)));
        assert!(ka.answer(id));
        assert!(!ka.answer(id));
        assert!(ka.start().is_some());
    }

    #[tokio::test]
    async fn test_keep_alive_expires() {
        let mut ka = KeepAlive::new(Duration::from_millis(50));
        assert!(!ka.expired());
        ka.start();
        assert!(!ka.expired());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(ka.expired());
        assert!(ka.start().is_none());
    }
}
