//! Wires [`GlobalChat`] into the server.

use std::sync::Arc;

use cobble_chat::{strip_control_sequences, GlobalChat};
use cobble_packet::packetid::play;
use cobble_player::{Packet757, Player, PlayerError};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{Component, HandlerRegistry};

/// Longest chat line a 1.18 client may send.
const MAX_CHAT_LEN: usize = 256;

impl Component for GlobalChat {
    fn init(&self, handlers: &mut HandlerRegistry) {
        let chat = self.clone();
        handlers.add(play::SERVERBOUND_CHAT, move |player: Arc<Player>, packet: Packet757| {
            let chat = chat.clone();
            async move {
                let mut raw = String::new();
                packet.0.scan(&mut raw)?;
                if raw.chars().count() > MAX_CHAT_LEN {
                    return Err(PlayerError::Handler(format!(
                        "chat message longer than {MAX_CHAT_LEN} characters"
                    )));
                }
                let (text, _) = strip_control_sequences(&raw);
                chat.send_message(player, text)
                    .await
                    .map_err(|e| PlayerError::Handler(e.to_string()))
            }
        });
    }

    fn run(self: Arc<Self>, cancel: CancellationToken) -> BoxFuture<'static, ()> {
        async move { GlobalChat::run(&self, cancel).await }.boxed()
    }

    fn add_player(&self, player: Arc<Player>) -> BoxFuture<'_, ()> {
        async move {
            if let Err(e) = GlobalChat::add_player(self, player).await {
                tracing::debug!(error = %e, "player not added to global chat");
            }
        }
        .boxed()
    }

    fn remove_player(&self, player: Arc<Player>) -> BoxFuture<'_, ()> {
        async move {
            if let Err(e) = GlobalChat::remove_player(self, player).await {
                tracing::debug!(error = %e, "player not removed from global chat");
            }
        }
        .boxed()
    }
}
