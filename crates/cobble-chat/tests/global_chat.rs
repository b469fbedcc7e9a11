//! Integration tests for the global chat actor.

use std::sync::Arc;
use std::time::Duration;

use cobble_chat::{ChatError, ChatPosition, GlobalChat, Message};
use cobble_packet::packetid::play;
use cobble_player::{Gamemode, Player};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn player(name: &str) -> Arc<Player> {
    Arc::new(Player::new(Uuid::new_v4(), name, 1, Gamemode::Survival))
}

/// Pulls the next packet and decodes it as a clientbound chat packet.
async fn next_chat(player: &Player) -> (Message, ChatPosition, Uuid) {
    let packet = tokio::time::timeout(Duration::from_secs(1), player.queue().pull())
        .await
        .expect("a chat packet should arrive")
        .expect("queue is open");
    assert_eq!(packet.id, play::CLIENTBOUND_CHAT);

    let mut message = Message::default();
    let mut position = ChatPosition::default();
    let mut sender = Uuid::nil();
    let n = packet
        .scan((&mut message, &mut position, &mut sender))
        .expect("well-formed chat packet");
    assert_eq!(n, packet.data.len());
    (message, position, sender)
}

async fn assert_silent(player: &Player) {
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(player.queue().is_empty(), "{} got an unexpected packet", player.name);
}

fn started() -> (GlobalChat, CancellationToken) {
    let chat = GlobalChat::new(8);
    let cancel = CancellationToken::new();
    chat.spawn(cancel.clone());
    (chat, cancel)
}

#[tokio::test]
async fn test_join_is_announced_to_existing_members_only() {
    let (chat, _cancel) = started();
    let alice = player("Alice");
    let bob = player("Bob");

    chat.add_player(alice.clone()).await.unwrap();
    assert_silent(&alice).await;

    chat.add_player(bob.clone()).await.unwrap();
    let (message, position, sender) = next_chat(&alice).await;
    assert_eq!(message.translate.as_deref(), Some("multiplayer.player.joined"));
    assert_eq!(message.with[0].text, "Bob");
    assert_eq!(message.color, Some(cobble_chat::Color::Yellow));
    assert_eq!(position, ChatPosition::System);
    assert_eq!(sender, Uuid::nil());

    // Exactly one announcement, and none for the newcomer.
    assert_silent(&alice).await;
    assert_silent(&bob).await;
}

#[tokio::test]
async fn test_leave_is_announced_to_leaver_too() {
    let (chat, _cancel) = started();
    let alice = player("Alice");
    let bob = player("Bob");

    chat.add_player(alice.clone()).await.unwrap();
    chat.add_player(bob.clone()).await.unwrap();
    next_chat(&alice).await; // Bob joined

    chat.remove_player(bob.clone()).await.unwrap();
    for member in [&alice, &bob] {
        let (message, position, _) = next_chat(member).await;
        assert_eq!(message.translate.as_deref(), Some("multiplayer.player.left"));
        assert_eq!(message.with[0].text, "Bob");
        assert_eq!(position, ChatPosition::System);
    }

    // Bob is gone: a later join is seen by Alice alone.
    chat.add_player(player("Carol")).await.unwrap();
    next_chat(&alice).await;
    assert_silent(&bob).await;
}

#[tokio::test]
async fn test_chat_line_reaches_every_member() {
    let (chat, _cancel) = started();
    let alice = player("Alice");
    let bob = player("Bob");
    chat.add_player(alice.clone()).await.unwrap();
    chat.add_player(bob.clone()).await.unwrap();
    next_chat(&alice).await;

    chat.send_message(alice.clone(), "hello".into()).await.unwrap();

    for member in [&alice, &bob] {
        let (message, position, sender) = next_chat(member).await;
        assert_eq!(message.translate.as_deref(), Some("chat.type.text"));
        assert_eq!(message.with[0].text, "Alice");
        assert_eq!(message.with[1].text, "hello");
        assert_eq!(position, ChatPosition::Chat);
        assert_eq!(sender, alice.uuid);
        assert_eq!(message.to_string(), "chat.type.text[Alice, hello]");
    }
}

#[tokio::test]
async fn test_chat_sender_has_click_and_hover() {
    let (chat, _cancel) = started();
    let alice = player("Alice");
    chat.add_player(alice.clone()).await.unwrap();
    chat.send_message(alice.clone(), "hi".into()).await.unwrap();

    let (message, _, _) = next_chat(&alice).await;
    let json: serde_json::Value = serde_json::from_str(&message.to_json()).unwrap();
    let name = &json["with"][0];
    assert_eq!(name["clickEvent"]["value"], "/msg Alice");
    assert_eq!(
        name["hoverEvent"]["value"]["text"],
        format!("{{id:\"{}\",name:\"Alice\"}}", alice.uuid)
    );
}

#[tokio::test]
async fn test_slow_member_does_not_stall_broadcast() {
    let (chat, _cancel) = started();
    let idle = player("Idle");
    let active = player("Active");
    chat.add_player(idle.clone()).await.unwrap();
    chat.add_player(active.clone()).await.unwrap();

    // Nobody drains Idle's queue; Active must still see all lines in order.
    for i in 0..100 {
        chat.send_message(active.clone(), format!("line {i}")).await.unwrap();
    }
    for i in 0..100 {
        let (message, _, _) = next_chat(&active).await;
        assert_eq!(message.with[1].text, format!("line {i}"));
    }
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(idle.queue().len(), 101);
}

#[tokio::test]
async fn test_cancel_stops_actor() {
    let chat = GlobalChat::new(4);
    let cancel = CancellationToken::new();
    let task = chat.spawn(cancel.clone());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("actor stopped")
        .unwrap();

    assert!(matches!(
        chat.send_message(player("Late"), "hi".into()).await,
        Err(ChatError::Stopped)
    ));
}
