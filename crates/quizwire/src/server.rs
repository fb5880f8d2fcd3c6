//! `QuizServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket edge → gateway → room registry,
//! with the content generator injected behind its trait.

use std::sync::Arc;
use std::time::Duration;

use quizwire_content::QuizGenerator;
use quizwire_room::{RoomConfig, RoomRegistry};
use tokio::net::TcpListener;

use crate::ws;
use crate::ServerError;

/// Server-wide configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Per-room policy (results delay, idle limit).
    pub room: RoomConfig,
    /// How often the idle-room sweep runs.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room: RoomConfig::default(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Shared state handed to every connection task.
pub(crate) struct ServerState {
    pub(crate) registry: Arc<RoomRegistry>,
    pub(crate) generator: Arc<dyn QuizGenerator>,
}

/// Builder for configuring and starting a quiz server.
pub struct QuizServerBuilder {
    config: ServerConfig,
}

impl QuizServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the listen address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long the results screen stays up between questions.
    pub fn results_delay(mut self, delay: Duration) -> Self {
        self.config.room.results_delay = delay;
        self
    }

    /// Sets the idle limit after which rooms are closed.
    pub fn max_idle(mut self, max_idle: Duration) -> Self {
        self.config.room.max_idle = max_idle;
        self
    }

    /// Sets the idle-sweep cadence.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Binds the listener and assembles the server around the given
    /// quiz generator.
    pub async fn build(
        self,
        generator: Arc<dyn QuizGenerator>,
    ) -> Result<QuizServer, ServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "listener bound");

        let registry = RoomRegistry::new(self.config.room.clone());
        let state = Arc::new(ServerState {
            registry,
            generator,
        });

        Ok(QuizServer {
            listener,
            state,
            sweep_interval: self.config.sweep_interval,
        })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running quiz server.
pub struct QuizServer {
    listener: TcpListener,
    state: Arc<ServerState>,
    sweep_interval: Duration,
}

impl QuizServer {
    /// Creates a new builder.
    pub fn builder() -> QuizServerBuilder {
        QuizServerBuilder::new()
    }

    /// The address the server actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the process ends.
    ///
    /// Each connection runs in its own task; a failure in one never
    /// touches the others. A background task sweeps idle rooms.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("quizwire server running");

        let sweep_state = Arc::clone(&self.state);
        let sweep_interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            // The first tick is immediate and would sweep an empty map.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let closed = sweep_state.registry.sweep_idle().await;
                if closed > 0 {
                    tracing::info!(closed, "idle sweep closed rooms");
                }
            }
        });

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::debug!(%addr, "accepted tcp connection");
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = ws::serve_socket(stream, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
