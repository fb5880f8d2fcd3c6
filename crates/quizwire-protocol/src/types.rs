//! Identifier types shared across the protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for one client connection.
///
/// This is the only notion of identity in the system: an opaque,
/// connection-scoped number assigned by the server when the socket is
/// accepted. It is never authenticated and never survives a reconnect.
///
/// `#[serde(transparent)]` makes a `ConnectionId(42)` serialize as the
/// plain number `42` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The join key for a room: a short uppercase alphanumeric token.
///
/// Codes are generated by the room registry; this type only carries
/// them. Comparison is exact (case-sensitive) — clients are expected
/// to send the code exactly as issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps an already-generated code string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
