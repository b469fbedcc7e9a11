//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Cobble server. It ties together
//! the layers: transport → login → player → components.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use cobble_chat::GlobalChat;
use cobble_player::{Packet757, Player, PlayerError};
use cobble_transport::{Connection, TcpTransport, Transport, TransportError, WebSocketTransport};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::connection::handle_connection;
use crate::{CobbleError, Component, HandlerRegistry, ServerConfig};

/// Shared server state passed to each connection task.
pub(crate) struct ServerState {
    pub(crate) config: ServerConfig,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) components: Vec<Arc<dyn Component>>,
    next_entity_id: AtomicI32,
}

impl ServerState {
    pub(crate) fn next_entity_id(&self) -> i32 {
        self.next_entity_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Builder for configuring and starting a Cobble server.
///
/// # Example
///
/// ```rust,no_run
/// use cobble::prelude::*;
///
/// # async fn start() -> Result<(), CobbleError> {
/// let server = Server::builder()
///     .bind("0.0.0.0:25565")
///     .with_global_chat()
///     .build()
///     .await?;
/// server.run(CancellationToken::new()).await
/// # }
/// ```
pub struct ServerBuilder {
    config: ServerConfig,
    handlers: HandlerRegistry,
    components: Vec<Arc<dyn Component>>,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            handlers: HandlerRegistry::new(),
            components: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Adds a component. Its handlers are registered when the server is
    /// built.
    pub fn component(self, component: impl Component) -> Self {
        self.component_arc(Arc::new(component))
    }

    /// Adds a component the caller keeps a reference to.
    pub fn component_arc(mut self, component: Arc<dyn Component>) -> Self {
        self.components.push(component);
        self
    }

    /// Adds a [`GlobalChat`] sized from the configured mailbox capacity.
    pub fn with_global_chat(self) -> Self {
        let chat = GlobalChat::new(self.config.mailbox_capacity);
        self.component(chat)
    }

    /// Registers a packet handler for play-state opcode `id`.
    pub fn handler<F, Fut>(mut self, id: i32, handler: F) -> Self
    where
        F: Fn(Arc<Player>, Packet757) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PlayerError>> + Send + 'static,
    {
        self.handlers.add(id, handler);
        self
    }

    /// Builds a server on a raw TCP listener, the way vanilla clients
    /// connect.
    pub async fn build(self) -> Result<Server<TcpTransport>, CobbleError> {
        let transport = TcpTransport::bind(&self.config.bind).await?;
        Ok(self.build_with(transport))
    }

    /// Builds a server that speaks the same packets over WebSocket.
    pub async fn build_websocket(self) -> Result<Server<WebSocketTransport>, CobbleError> {
        let transport = WebSocketTransport::bind(&self.config.bind).await?;
        Ok(self.build_with(transport))
    }

    /// Builds a server on an already bound transport.
    pub fn build_with<T>(mut self, transport: T) -> Server<T>
    where
        T: Transport<Error = TransportError>,
        T::Connection: Connection<Error = TransportError>,
    {
        for component in &self.components {
            component.init(&mut self.handlers);
        }

        let state = Arc::new(ServerState {
            config: self.config,
            handlers: self.handlers,
            components: self.components,
            next_entity_id: AtomicI32::new(1),
        });

        Server { transport, state }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Cobble server bound to a transport.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<T> {
    transport: T,
    state: Arc<ServerState>,
}

impl Server<TcpTransport> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<T> Server<T>
where
    T: Transport<Error = TransportError>,
    T::Connection: Connection<Error = TransportError>,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Runs the server until `cancel` fires.
    ///
    /// Starts every component, then accepts connections and spawns a task
    /// for each. On cancellation it stops accepting, lets every connection
    /// disconnect its player, and only then stops the components, so they
    /// still see every `remove_player`.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), CobbleError> {
        let components_cancel = CancellationToken::new();
        let mut components = JoinSet::new();
        for component in &self.state.components {
            components.spawn(Arc::clone(component).run(components_cancel.clone()));
        }

        tracing::info!(addr = ?self.local_addr().ok(), "Cobble server running");

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        let cancel = cancel.clone();
                        connections.spawn(async move {
                            if let Err(e) = handle_connection(conn, state, cancel).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                // Reap finished connection tasks so the set stays small.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        tracing::info!(connections = connections.len(), "shutting down");
        self.transport.shutdown().await?;
        while connections.join_next().await.is_some() {}

        components_cancel.cancel();
        while components.join_next().await.is_some() {}

        tracing::info!("Cobble server stopped");
        Ok(())
    }
}
