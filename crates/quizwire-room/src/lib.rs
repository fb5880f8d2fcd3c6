//! Room lifecycle for Quizwire.
//!
//! Each room runs as an isolated tokio task (actor model) owning its
//! [`GameRoom`] state machine and its one [`Countdown`] timer slot.
//! Everything that can mutate a room — joins, answer submissions, host
//! controls, timer events, disconnects — is serialized through the
//! actor's mailbox, so the state machine never sees two events at once.
//!
//! # Key types
//!
//! - [`GameRoom`] — the phase state machine and scoring, pure enough
//!   to unit-test without any timer or channel wiring
//! - [`RoundTracker`] — per-question answer collection
//! - [`RoomHandle`] — send operations to a running room actor
//! - [`RoomRegistry`] — create rooms, resolve codes, route disconnects
//! - [`Phase`] — the lifecycle state machine
//!
//! [`Countdown`]: quizwire_countdown::Countdown

mod actor;
mod error;
mod game;
mod registry;
mod round;

pub use actor::{EventSender, RoomHandle, RoomStatus};
pub use error::RoomError;
pub use game::{GameRoom, Outbound, Phase, Recipient};
pub use registry::{RoomConfig, RoomRegistry};
pub use round::RoundTracker;
