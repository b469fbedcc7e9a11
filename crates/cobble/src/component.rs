//! Pluggable server subsystems.

use std::sync::Arc;

use cobble_player::Player;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::HandlerRegistry;

/// A subsystem that lives as long as the server: it registers packet
/// handlers, runs a background task, and hears about every player that
/// logs in or out.
///
/// [`GlobalChat`](cobble_chat::GlobalChat) is the built-in one.
pub trait Component: Send + Sync + 'static {
    /// Registers packet handlers. Called once while the server is built.
    fn init(&self, handlers: &mut HandlerRegistry);

    /// The component's background task. Should return once `cancel` fires.
    fn run(self: Arc<Self>, cancel: CancellationToken) -> BoxFuture<'static, ()>;

    /// Called after a player finished logging in, before any of their
    /// play packets are handled.
    fn add_player(&self, player: Arc<Player>) -> BoxFuture<'_, ()>;

    /// Called once the player's connection is ending.
    fn remove_player(&self, player: Arc<Player>) -> BoxFuture<'_, ()>;
}
