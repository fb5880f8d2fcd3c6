//! The single-active-timer slot that drives a quiz room forward.
//!
//! Each room owns exactly one [`Countdown`]. At any moment it is either
//! idle or running one of two timers:
//!
//! - a **question countdown** that fires once per second with the
//!   remaining time and elapses when the count would drop below zero;
//! - a **delay** (the fixed results pause) that fires exactly once.
//!
//! Starting a timer always replaces the previous one — replace-and-
//! cancel is a single assignment, so a superseded timer can never fire.
//! This is the whole point of the type: ad-hoc timer handles scattered
//! across callbacks are how ghost broadcasts happen after a room was
//! skipped, ended, or torn down.
//!
//! # Integration
//!
//! [`Countdown::wait`] pends forever while idle, so it can sit in a
//! room actor's `tokio::select!` loop unconditionally:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = mailbox.recv() => { /* handle commands */ }
//!         event = countdown.wait() => { /* tick or phase advance */ }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// What the countdown produced when [`Countdown::wait`] resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// One second of a question countdown elapsed; `remaining` is the
    /// number of whole seconds left on the clock (reaches 0 before the
    /// final [`CountdownEvent::Elapsed`]).
    Tick { remaining: u32 },
    /// The active timer ran out. For a question countdown this fires
    /// one second after the `remaining: 0` tick; for a delay it is the
    /// only event.
    Elapsed,
}

#[derive(Debug)]
enum Slot {
    Question { remaining: u32, next_fire: Instant },
    Delay { fire_at: Instant },
}

/// A room's one-and-only timer.
#[derive(Debug, Default)]
pub struct Countdown {
    slot: Option<Slot>,
}

impl Countdown {
    /// Creates an idle countdown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a question countdown of `duration_secs` whole seconds,
    /// replacing (and thereby cancelling) whatever was running.
    ///
    /// The first tick fires one second from now with
    /// `remaining = duration_secs - 1`; the expiry fires one second
    /// after the `remaining: 0` tick.
    pub fn start_question(&mut self, duration_secs: u32) {
        trace!(duration_secs, "question countdown started");
        self.slot = Some(Slot::Question {
            remaining: duration_secs,
            next_fire: Instant::now() + Duration::from_secs(1),
        });
    }

    /// Starts a one-shot delay, replacing whatever was running.
    pub fn start_delay(&mut self, delay: Duration) {
        trace!(?delay, "delay started");
        self.slot = Some(Slot::Delay {
            fire_at: Instant::now() + delay,
        });
    }

    /// Stops the active timer, if any. Returns whether one was live.
    pub fn cancel(&mut self) -> bool {
        let was_live = self.slot.take().is_some();
        if was_live {
            trace!("countdown cancelled");
        }
        was_live
    }

    /// Whether no timer is currently running.
    pub fn is_idle(&self) -> bool {
        self.slot.is_none()
    }

    /// Waits for the next timer event.
    ///
    /// Pends forever while idle — `tokio::select!` will simply keep
    /// servicing its other branches. After [`CountdownEvent::Elapsed`]
    /// the countdown is idle again; after a tick it stays armed for the
    /// next second.
    pub async fn wait(&mut self) -> CountdownEvent {
        let fire_at = match &self.slot {
            Some(Slot::Question { next_fire, .. }) => *next_fire,
            Some(Slot::Delay { fire_at }) => *fire_at,
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(fire_at).await;

        match self.slot.take() {
            Some(Slot::Question { remaining, next_fire }) => {
                if remaining == 0 {
                    // The count would go below zero: the window is over.
                    CountdownEvent::Elapsed
                } else {
                    let remaining = remaining - 1;
                    self.slot = Some(Slot::Question {
                        remaining,
                        next_fire: next_fire + Duration::from_secs(1),
                    });
                    CountdownEvent::Tick { remaining }
                }
            }
            Some(Slot::Delay { .. }) => CountdownEvent::Elapsed,
            // `wait` is the only consumer and it just saw a live slot.
            None => unreachable!("slot vanished mid-wait"),
        }
    }
}
