//! Unified error type for the server crate.

use quizwire_protocol::ProtocolError;
use quizwire_room::RoomError;

/// Top-level error wrapping the layer-specific ones.
///
/// The `#[from]` attributes generate the conversions, so `?` moves
/// errors up from any layer without ceremony.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding or accepting connections failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The WebSocket layer failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An event could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizwire_protocol::RoomCode;

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomCode::new("AB12CD"));
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Room(_)));
        assert!(server_err.to_string().contains("not found"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Protocol(_)));
    }
}
