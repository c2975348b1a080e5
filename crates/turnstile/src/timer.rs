//! Per-turn countdown.
//!
//! [`Countdown`] is the authoritative value held by the session.
//! [`TurnTimer`] only produces the once-per-period ticks that drive it; the
//! room arms it on every turn switch and cancels it when the game ends.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, instrument};

/// Seconds a player has to move.
pub const TURN_SECONDS: u8 = 10;

/// What happens when a player runs out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// The turn passes to the opponent. Nobody loses.
    #[default]
    SkipTurn,
    /// The player who timed out loses the game.
    Forfeit,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Time remains.
    Running(u8),
    /// The countdown just reached zero.
    Expired,
}

/// Seconds remaining in the current turn, bounded to `0..=TURN_SECONDS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u8,
}

impl Countdown {
    /// A full countdown.
    pub fn new() -> Self {
        Self {
            remaining: TURN_SECONDS,
        }
    }

    /// Seconds remaining.
    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    /// Back to a full turn.
    pub fn reset(&mut self) {
        self.remaining = TURN_SECONDS;
    }

    /// Counts down one second.
    pub fn tick(&mut self) -> Tick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Recurring tick source scoped to the current turn.
#[derive(Debug)]
pub struct TurnTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl TurnTimer {
    /// Creates a disarmed timer that ticks every `period` once armed.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Starts (or restarts) the countdown; the first tick lands one full
    /// period from now.
    #[instrument(skip(self))]
    pub fn arm(&mut self) {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        debug!(period_ms = self.period.as_millis() as u64, "Turn timer armed");
    }

    /// Stops ticking. No tick is delivered after this returns.
    #[instrument(skip(self))]
    pub fn cancel(&mut self) {
        if self.interval.take().is_some() {
            debug!("Turn timer cancelled");
        }
    }

    /// Whether the timer is running.
    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Waits for the next tick. Never completes while disarmed.
    ///
    /// Cancel safe.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
