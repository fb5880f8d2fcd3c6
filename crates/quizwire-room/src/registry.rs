//! Room registry: creates rooms, resolves codes, routes disconnects.
//!
//! This is an injectable service — construct one per server (or per
//! test), never a process global. The registry's map is the only state
//! shared across connections; everything per-room lives inside the
//! room's own actor, so the lock here is held only for map edits and
//! never across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use quizwire_protocol::{ConnectionId, RoomCode};
use rand::Rng;
use tracing::{info, warn};

use crate::actor::{spawn_room, EventSender};
use crate::RoomHandle;

/// Generated join codes are this long.
const CODE_LENGTH: usize = 6;
/// Uppercase alphanumerics, matching what hosts read out loud.
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Per-room policy knobs applied at creation time.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long the results screen stays up between questions.
    pub results_delay: Duration,
    /// Rooms idle longer than this are closed by the sweep.
    pub max_idle: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            results_delay: Duration::from_secs(5),
            max_idle: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Default)]
struct Inner {
    rooms: HashMap<RoomCode, RoomHandle>,
    /// Which room each participant connection is in.
    participants: HashMap<ConnectionId, RoomCode>,
    /// Which room each host connection owns.
    hosts: HashMap<ConnectionId, RoomCode>,
}

/// The process-wide room table.
pub struct RoomRegistry {
    config: RoomConfig,
    inner: Mutex<Inner>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(config: RoomConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// All operations hold the lock only for map edits; a poisoned
    /// lock still guards a consistent map, so recover the guard.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Creates a room owned by `host` and spawns its actor.
    /// Always succeeds; code collisions are retried internally.
    pub fn create_room(
        self: &Arc<Self>,
        host: ConnectionId,
        host_sender: EventSender,
    ) -> RoomHandle {
        let mut inner = self.lock();

        let code = loop {
            let candidate = random_code();
            if !inner.rooms.contains_key(&candidate) {
                break candidate;
            }
            // A 36^6 space makes collisions rare even with thousands
            // of rooms; loop again rather than reason about odds.
        };

        let handle = spawn_room(
            code.clone(),
            host,
            host_sender,
            self.config.results_delay,
            Arc::clone(self),
        );
        inner.rooms.insert(code.clone(), handle.clone());
        inner.hosts.insert(host, code.clone());

        info!(room = %code, %host, "room created");
        handle
    }

    /// Looks up a room by code.
    pub fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.lock().rooms.get(code).cloned()
    }

    /// Drops a room and every connection index pointing at it. Called
    /// by the room's own actor as it stops.
    pub(crate) fn remove(&self, code: &RoomCode) {
        let mut inner = self.lock();
        if inner.rooms.remove(code).is_some() {
            inner.participants.retain(|_, c| c != code);
            inner.hosts.retain(|_, c| c != code);
            info!(room = %code, "room deregistered");
        }
    }

    /// Records that `conn` joined the room at `code`, for disconnect
    /// routing.
    pub fn bind_participant(&self, conn: ConnectionId, code: RoomCode) {
        self.lock().participants.insert(conn, code);
    }

    /// Forgets a participant binding, returning the room it pointed at.
    pub fn unbind_participant(
        &self,
        conn: ConnectionId,
    ) -> Option<RoomCode> {
        self.lock().participants.remove(&conn)
    }

    /// The room `conn` participates in, if any.
    pub fn participant_room(&self, conn: ConnectionId) -> Option<RoomCode> {
        self.lock().participants.get(&conn).cloned()
    }

    /// The room `conn` hosts, if any.
    pub fn host_room(&self, conn: ConnectionId) -> Option<RoomCode> {
        self.lock().hosts.get(&conn).cloned()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Closes rooms that have been idle past the configured limit.
    /// Returns how many were told to shut down.
    pub async fn sweep_idle(&self) -> usize {
        let handles: Vec<RoomHandle> =
            self.lock().rooms.values().cloned().collect();

        let mut closed = 0;
        for handle in handles {
            // Rooms that fail to answer are already stopping.
            let Ok(status) = handle.status().await else {
                continue;
            };
            if status.idle > self.config.max_idle {
                warn!(
                    room = %status.code,
                    idle_secs = status.idle.as_secs(),
                    "closing idle room"
                );
                let _ = handle.shutdown().await;
                closed += 1;
            }
        }
        closed
    }
}

fn random_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect();
    RoomCode::new(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_code_format() {
        for _ in 0..100 {
            let code = random_code();
            let s = code.as_str();
            assert_eq!(s.len(), CODE_LENGTH);
            assert!(s
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_random_codes_are_not_constant() {
        let a = random_code();
        let b = random_code();
        let c = random_code();
        // Three identical draws from a 36^6 space means a broken RNG.
        assert!(!(a == b && b == c));
    }
}
