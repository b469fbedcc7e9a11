//! The global chat actor.
//!
//! Every player in global chat lives in one `HashMap` owned by a single
//! task. Chat lines, joins, and leaves arrive on three bounded mailboxes
//! and are handled one at a time, so the map needs no lock. Fan-out only
//! pushes onto player queues, which never wait, so a slow client cannot
//! hold up the loop.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

use cobble_packet::packetid::play;
use cobble_packet::{Decode, Encode, Packet, PacketError};
use cobble_player::{Packet757, Player};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{snbt, ChatError, ClickEvent, Color, HoverEvent, Message};

/// Default capacity of each of the three mailboxes.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Consecutive chat lines handled before a pending leave is served.
const CHAT_BURST: usize = 32;

/// Where the client displays a chat packet, one byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatPosition {
    /// Player chat line.
    #[default]
    Chat,
    /// System message in the chat box.
    System,
    /// Above the hotbar.
    GameInfo,
}

impl ChatPosition {
    pub fn id(self) -> u8 {
        match self {
            Self::Chat => 0,
            Self::System => 1,
            Self::GameInfo => 2,
        }
    }
}

impl Encode for ChatPosition {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        self.id().write_to(w)
    }
}

impl Decode for ChatPosition {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut id = 0u8;
        let n = id.read_from(r)?;
        *self = match id {
            0 => Self::Chat,
            1 => Self::System,
            2 => Self::GameInfo,
            other => {
                return Err(PacketError::invalid(
                    "chat position",
                    format!("unknown position {other}"),
                )
                .after(n));
            }
        };
        Ok(n)
    }
}

struct ChatItem {
    player: Arc<Player>,
    text: String,
}

/// Handle to the global chat.
///
/// Cheap to clone. The actor behind it is started once, with
/// [`run`](Self::run) or [`spawn`](Self::spawn). Messages still sitting in
/// the mailboxes when it stops are discarded.
#[derive(Clone)]
pub struct GlobalChat {
    msg: mpsc::Sender<ChatItem>,
    join: mpsc::Sender<Arc<Player>>,
    quit: mpsc::Sender<Arc<Player>>,
    actor: Arc<Mutex<Option<ChatActor>>>,
}

impl GlobalChat {
    /// Creates the handle and its (not yet running) actor.
    pub fn new(mailbox_capacity: usize) -> Self {
        let capacity = mailbox_capacity.max(1);
        let (msg_tx, msg_rx) = mpsc::channel(capacity);
        let (join_tx, join_rx) = mpsc::channel(capacity);
        let (quit_tx, quit_rx) = mpsc::channel(capacity);

        let actor = ChatActor {
            msg: msg_rx,
            join: join_rx,
            quit: quit_rx,
            players: HashMap::new(),
        };

        Self {
            msg: msg_tx,
            join: join_tx,
            quit: quit_tx,
            actor: Arc::new(Mutex::new(Some(actor))),
        }
    }

    fn take_actor(&self) -> Option<ChatActor> {
        self.actor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Runs the actor until `cancel` fires.
    ///
    /// Only the first call to `run` or [`spawn`](Self::spawn) starts the
    /// actor; later calls return at once.
    pub async fn run(&self, cancel: CancellationToken) {
        match self.take_actor() {
            Some(actor) => actor.run(cancel).await,
            None => tracing::warn!("global chat actor already started"),
        }
    }

    /// Starts the actor on its own task.
    ///
    /// The task ends when `cancel` fires or when every handle has been
    /// dropped.
    pub fn spawn(&self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let actor = self.take_actor();
        tokio::spawn(async move {
            match actor {
                Some(actor) => actor.run(cancel).await,
                None => tracing::warn!("global chat actor already started"),
            }
        })
    }

    /// Broadcasts a chat line from `player` to everyone in global chat.
    ///
    /// `text` should already have control sequences stripped.
    pub async fn send_message(&self, player: Arc<Player>, text: String) -> Result<(), ChatError> {
        self.msg
            .send(ChatItem { player, text })
            .await
            .map_err(|_| ChatError::Stopped)
    }

    /// Announces `player` to the current members, then adds them.
    pub async fn add_player(&self, player: Arc<Player>) -> Result<(), ChatError> {
        self.join.send(player).await.map_err(|_| ChatError::Stopped)
    }

    /// Announces `player`'s departure to all members (the leaver
    /// included), then removes them.
    pub async fn remove_player(&self, player: Arc<Player>) -> Result<(), ChatError> {
        self.quit.send(player).await.map_err(|_| ChatError::Stopped)
    }
}

/// Owns the player registry. Lives inside the task started by
/// [`GlobalChat::run`]; nothing outside that task can reach the map.
struct ChatActor {
    msg: mpsc::Receiver<ChatItem>,
    join: mpsc::Receiver<Arc<Player>>,
    quit: mpsc::Receiver<Arc<Player>>,
    players: HashMap<Uuid, Arc<Player>>,
}

impl ChatActor {
    async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("global chat started");

        let mut burst = 0;
        loop {
            // After a long run of chat lines, let one waiting leave through
            // so teardown never waits on a busy chat.
            if burst >= CHAT_BURST {
                burst = 0;
                if let Ok(player) = self.quit.try_recv() {
                    self.handle_leave(player);
                    continue;
                }
            }

            // Joins before chat before leaves: whatever one caller submits
            // as join, chat, leave is applied in that order even when all
            // three are already waiting, unless a chat burst lets the leave
            // go first.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(player) = self.join.recv() => self.handle_join(player),
                Some(item) = self.msg.recv() => {
                    burst += 1;
                    self.handle_chat(item);
                }
                Some(player) = self.quit.recv() => {
                    burst = 0;
                    self.handle_leave(player);
                }
                else => break,
            }
        }

        tracing::info!(players = self.players.len(), "global chat stopped");
    }

    fn handle_chat(&self, item: ChatItem) {
        tracing::info!(player = %item.player, text = %item.text, "chat");
        let name = &item.player.name;
        let sender = Message::text(name.as_str())
            .with_click(ClickEvent::SuggestCommand(format!("/msg {name}")))
            .with_hover(HoverEvent::show_entity(snbt::entity_tooltip(
                item.player.uuid,
                name,
            )));
        let message = Message::translate("chat.type.text", [sender, Message::text(item.text)]);
        self.broadcast(message, ChatPosition::Chat, item.player.uuid);
    }

    // Announce first, then insert: the newcomer never sees their own join
    // line. Leave mirrors it, so the leaver does see their own departure.
    fn handle_join(&mut self, player: Arc<Player>) {
        let message = Message::translate("multiplayer.player.joined", [Message::text(player.name.as_str())])
            .with_color(Color::Yellow);
        self.broadcast(message, ChatPosition::System, Uuid::nil());
        tracing::info!(player = %player, online = self.players.len() + 1, "joined global chat");
        self.players.insert(player.uuid, player);
    }

    fn handle_leave(&mut self, player: Arc<Player>) {
        let message = Message::translate("multiplayer.player.left", [Message::text(player.name.as_str())])
            .with_color(Color::Yellow);
        self.broadcast(message, ChatPosition::System, Uuid::nil());
        self.players.remove(&player.uuid);
        tracing::info!(player = %player, online = self.players.len(), "left global chat");
    }

    fn broadcast(&self, message: Message, position: ChatPosition, sender: Uuid) {
        let packet = match Packet::marshal(play::CLIENTBOUND_CHAT, (message, position, sender)) {
            Ok(packet) => Packet757(packet),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode chat packet");
                return;
            }
        };
        for player in self.players.values() {
            player.write_packet(packet.clone());
        }
    }
}
