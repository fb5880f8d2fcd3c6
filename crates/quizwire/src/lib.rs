//! # Quizwire
//!
//! Real-time, room-based multiplayer quiz game server.
//!
//! A host creates a room, fills it with generated or uploaded
//! questions, and drives a timed question loop; participants join by
//! code, answer against the countdown, and watch the standings move.
//! One tokio task owns each room, the server owns the WebSocket edge,
//! and the content collaborators (model-backed quiz generation,
//! document extraction) plug in behind traits.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quizwire::QuizServer;
//! use quizwire_content::{FallbackGenerator, GenerationPolicy, HttpModelBackend};
//!
//! # async fn run() -> Result<(), quizwire::ServerError> {
//! let generator = Arc::new(FallbackGenerator::new(
//!     HttpModelBackend::with_default_url("api-key"),
//!     GenerationPolicy::default(),
//! ));
//! let server = QuizServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(generator)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod gateway;
mod server;
mod ws;

pub use error::ServerError;
pub use server::{QuizServer, QuizServerBuilder, ServerConfig};
