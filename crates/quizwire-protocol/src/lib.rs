//! Wire protocol for Quizwire.
//!
//! This crate defines the language that quiz clients and the server
//! speak:
//!
//! - **Identifiers** ([`ConnectionId`], [`RoomCode`]) — who is talking
//!   and which room they mean.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — every named event
//!   of the session contract, in both directions.
//! - **Quiz data** ([`Question`], [`QuizParams`]) — question sets and
//!   the structural validation that gates them ([`QuizError`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events become
//!   bytes and back.
//!
//! The protocol layer knows nothing about rooms, timers, or sockets —
//! it only describes what travels on the wire.

mod codec;
mod error;
mod event;
mod quiz;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::{ProtocolError, QuizError};
pub use event::{
    ClientEvent, LeaderboardEntry, ParticipantInfo, PlayerAnswers,
    RoomSnapshot, ServerEvent,
};
pub use quiz::{validate_quiz, Question, QuizParams, OPTION_COUNT};
pub use types::{ConnectionId, RoomCode};
