//! Per-question answer collection.
//!
//! One [`RoundTracker`] instance lives inside the room state and is
//! reset at the start of every question. It owns the two facts a round
//! accumulates: who has answered, and how the chosen options are
//! distributed. "At most one answer per participant per question" is
//! enforced here, not by the shape of the collections.

use std::collections::{HashMap, HashSet};

use quizwire_protocol::ConnectionId;

/// Tracks submissions for the question currently on screen.
#[derive(Debug, Default)]
pub struct RoundTracker {
    answered: HashSet<ConnectionId>,
    distribution: HashMap<String, u32>,
}

impl RoundTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all round state. Called on every Results → Question
    /// transition.
    pub fn reset(&mut self) {
        self.answered.clear();
        self.distribution.clear();
    }

    /// Records `conn`'s answer. Returns `false` (and changes nothing)
    /// if they already answered this round — first submission wins.
    pub fn record(&mut self, conn: ConnectionId, answer: &str) -> bool {
        if !self.answered.insert(conn) {
            return false;
        }
        *self.distribution.entry(answer.to_string()).or_insert(0) += 1;
        true
    }

    /// Whether `conn` has answered this round.
    pub fn has_answered(&self, conn: ConnectionId) -> bool {
        self.answered.contains(&conn)
    }

    /// Drops `conn` from the answered set (participant disconnect
    /// mid-round). Their recorded choice stays in the distribution.
    pub fn forget(&mut self, conn: ConnectionId) -> bool {
        self.answered.remove(&conn)
    }

    /// How many participants have answered this round.
    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    /// The answered set in a stable order (ascending connection id).
    pub fn answered(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.answered.iter().copied().collect();
        ids.sort_by_key(|c| c.0);
        ids
    }

    /// The per-option tally for this round.
    pub fn distribution(&self) -> &HashMap<String, u32> {
        &self.distribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId(id)
    }

    #[test]
    fn test_first_submission_is_recorded() {
        let mut round = RoundTracker::new();
        assert!(round.record(conn(1), "Paris"));
        assert!(round.has_answered(conn(1)));
        assert_eq!(round.distribution()["Paris"], 1);
    }

    #[test]
    fn test_repeat_submissions_never_double_count() {
        let mut round = RoundTracker::new();
        assert!(round.record(conn(1), "Paris"));
        assert!(!round.record(conn(1), "Paris"));
        assert!(!round.record(conn(1), "Berlin"));

        // One participant contributes exactly one entry to the total,
        // no matter how often or with what answer they retry.
        let total: u32 = round.distribution().values().sum();
        assert_eq!(total, 1);
        assert_eq!(round.distribution().get("Berlin"), None);
    }

    #[test]
    fn test_distribution_tallies_across_participants() {
        let mut round = RoundTracker::new();
        round.record(conn(1), "Paris");
        round.record(conn(2), "Paris");
        round.record(conn(3), "Berlin");

        assert_eq!(round.distribution()["Paris"], 2);
        assert_eq!(round.distribution()["Berlin"], 1);
        assert_eq!(round.answered_count(), 3);
    }

    #[test]
    fn test_forget_removes_from_answered_but_keeps_tally() {
        let mut round = RoundTracker::new();
        round.record(conn(1), "Paris");
        assert!(round.forget(conn(1)));

        assert!(!round.has_answered(conn(1)));
        assert_eq!(round.answered_count(), 0);
        // The vote itself is history, not presence — it stays.
        assert_eq!(round.distribution()["Paris"], 1);
    }

    #[test]
    fn test_forget_unknown_connection_is_harmless() {
        let mut round = RoundTracker::new();
        assert!(!round.forget(conn(9)));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut round = RoundTracker::new();
        round.record(conn(1), "Paris");
        round.reset();

        assert_eq!(round.answered_count(), 0);
        assert!(round.distribution().is_empty());
        // After a reset the participant may answer the new question.
        assert!(round.record(conn(1), "Berlin"));
    }

    #[test]
    fn test_answered_is_sorted_by_connection_id() {
        let mut round = RoundTracker::new();
        round.record(conn(30), "a");
        round.record(conn(1), "b");
        round.record(conn(12), "c");
        assert_eq!(round.answered(), vec![conn(1), conn(12), conn(30)]);
    }
}
