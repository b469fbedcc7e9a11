//! Packet handlers keyed by opcode.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use cobble_player::{Packet757, Player, PlayerError};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

type HandlerFn =
    dyn Fn(Arc<Player>, Packet757) -> BoxFuture<'static, Result<(), PlayerError>> + Send + Sync;

/// Maps play-state opcodes to the handlers that process them.
///
/// Filled in while the server is being built (by
/// [`Component::init`](crate::Component::init) and
/// [`ServerBuilder::handler`](crate::ServerBuilder::handler)) and read-only
/// afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<i32, Vec<Arc<HandlerFn>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for packets with opcode `id`.
    ///
    /// Several handlers may share an opcode; they run in the order they
    /// were added.
    pub fn add<F, Fut>(&mut self, id: i32, handler: F)
    where
        F: Fn(Arc<Player>, Packet757) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PlayerError>> + Send + 'static,
    {
        let boxed: Arc<HandlerFn> = Arc::new(move |player, packet| handler(player, packet).boxed());
        self.handlers.entry(id).or_default().push(boxed);
    }

    /// Number of handlers registered for `id`.
    pub fn count(&self, id: i32) -> usize {
        self.handlers.get(&id).map_or(0, Vec::len)
    }

    /// Runs every handler registered for the packet's opcode, stopping at
    /// the first error.
    ///
    /// Packets nobody handles are ignored.
    pub async fn dispatch(&self, player: &Arc<Player>, packet: Packet757) -> Result<(), PlayerError> {
        let Some(handlers) = self.handlers.get(&packet.0.id) else {
            tracing::trace!(id = packet.0.id, player = %player, "no handler for packet");
            return Ok(());
        };
        for handler in handlers {
            handler(Arc::clone(player), packet.clone()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use cobble_packet::Packet;
    use cobble_player::Gamemode;
    use uuid::Uuid;

    fn player() -> Arc<Player> {
        Arc::new(Player::new(Uuid::new_v4(), "Steve", 1, Gamemode::Survival))
    }

    #[tokio::test]
    async fn test_handlers_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            registry.add(0x03, move |_, _| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(tag);
                    Ok(())
                }
            });
        }
        assert_eq!(registry.count(0x03), 2);

        registry
            .dispatch(&player(), Packet757(Packet::new(0x03, Vec::new())))
            .await
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_unknown_opcode_is_ignored() {
        let registry = HandlerRegistry::new();
        let result = registry
            .dispatch(&player(), Packet757(Packet::new(0x7F, Vec::new())))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_first_error_stops_dispatch() {
        let ran = Arc::new(Mutex::new(false));
        let mut registry = HandlerRegistry::new();
        registry.add(1, |_, packet: Packet757| async move {
            let mut value = 0i32;
            packet.0.scan(&mut value)?;
            Ok::<(), PlayerError>(())
        });
        {
            let ran = Arc::clone(&ran);
            registry.add(1, move |_, _| {
                let ran = Arc::clone(&ran);
                async move {
                    *ran.lock().unwrap() = true;
                    Ok(())
                }
            });
        }

        let err = registry
            .dispatch(&player(), Packet757(Packet::new(1, vec![0])))
            .await
            .unwrap_err();
        assert!(matches!(err, PlayerError::Packet(_)));
        assert!(!*ran.lock().unwrap());
    }
}
