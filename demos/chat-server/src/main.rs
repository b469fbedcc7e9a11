//! A global-chat server for 1.18 clients.
//!
//! ```text
//! chat-server [config.json] [--websocket]
//! ```
//!
//! Without a config file the defaults apply (`0.0.0.0:25565`). Log output
//! is controlled with `RUST_LOG`.

use std::sync::Arc;

use cobble::prelude::*;
use tracing_subscriber::EnvFilter;

/// Answers `/ping` with a line above the hotbar, visible only to the sender.
async fn ping(player: Arc<Player>, packet: Packet757) -> Result<(), PlayerError> {
    let mut text = String::new();
    packet.0.scan(&mut text)?;
    if text.trim() != "/ping" {
        return Ok(());
    }
    let reply = Message::text("pong").with_color(Color::Green);
    let packet = Packet::marshal(
        packetid::play::CLIENTBOUND_CHAT,
        (reply, ChatPosition::GameInfo, uuid::Uuid::nil()),
    )?;
    player.write_packet(Packet757(packet));
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(ServerConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let websocket = args.iter().any(|a| a == "--websocket");
    let config_path = args.iter().find(|a| !a.starts_with("--")).map(String::as_str);
    let config = load_config(config_path)?;

    tracing::info!(bind = %config.bind, websocket, "starting chat server");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received");
                cancel.cancel();
            }
        });
    }

    let builder = Server::builder()
        .config(config)
        .with_global_chat()
        .handler(packetid::play::SERVERBOUND_CHAT, ping);

    if websocket {
        builder.build_websocket().await?.run(cancel).await?;
    } else {
        builder.build().await?.run(cancel).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> String {
        let config = ServerConfig {
            bind: "127.0.0.1:0".into(),
            ..ServerConfig::default()
        };
        let server = Server::builder()
            .config(config)
            .with_global_chat()
            .handler(packetid::play::SERVERBOUND_CHAT, ping)
            .build_websocket()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(server.run(CancellationToken::new()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn send(ws: &mut Ws, packet: Packet) {
        let mut body = Vec::new();
        packet.pack(&mut body);
        ws.send(WsMessage::Binary(body.into())).await.unwrap();
    }

    async fn next(ws: &mut Ws) -> Packet {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        Packet::unpack(msg.into_data()).unwrap()
    }

    async fn join(addr: &str, name: &str) -> Ws {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        let handshake = Packet::marshal(
            packetid::handshake::SERVERBOUND_HANDSHAKE,
            (VarInt(packetid::PROTOCOL_VERSION), "localhost", 25565u16, VarInt(2)),
        )
        .unwrap();
        send(&mut ws, handshake).await;
        send(
            &mut ws,
            Packet::marshal(packetid::login::SERVERBOUND_LOGIN_START, name).unwrap(),
        )
        .await;
        assert_eq!(next(&mut ws).await.id, packetid::login::CLIENTBOUND_LOGIN_SUCCESS);
        tokio::time::sleep(Duration::from_millis(50)).await;
        ws
    }

    #[tokio::test]
    async fn test_ping_reply_goes_to_sender_only_after_broadcast() {
        let addr = start().await;
        let mut alice = join(&addr, "Alice").await;
        let mut bob = join(&addr, "Bob").await;
        next(&mut alice).await; // Bob joined

        send(
            &mut alice,
            Packet::marshal(packetid::play::SERVERBOUND_CHAT, "/ping").unwrap(),
        )
        .await;

        // Alice gets both the broadcast line and the private reply, in
        // either order; Bob only the broadcast.
        let mut positions = Vec::new();
        for _ in 0..2 {
            let packet = next(&mut alice).await;
            let mut message = Message::default();
            let mut position = ChatPosition::default();
            let mut sender = uuid::Uuid::nil();
            packet.scan((&mut message, &mut position, &mut sender)).unwrap();
            if position == ChatPosition::GameInfo {
                assert_eq!(message.text, "pong");
            }
            positions.push(position);
        }
        assert!(positions.contains(&ChatPosition::GameInfo));
        assert!(positions.contains(&ChatPosition::Chat));

        let packet = next(&mut bob).await;
        let mut message = Message::default();
        packet.scan(&mut message).unwrap();
        assert_eq!(message.translate.as_deref(), Some("chat.type.text"));
    }

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.bind, "0.0.0.0:25565");
    }
}
