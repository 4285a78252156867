//! # Simulation clock
//!
//! Wraps the timing side of a [`SimBus`]. Every participant drives its loop with the same
//! pattern:
//!
//! ```ignore
//! let mut clock = SimClock::new(&bus);
//! while clock.is_running(&bus) {
//!     // ... one step of work ...
//!     clock.advance(&mut bus)?;
//! }
//! ```
//!
//! All participants of a run must be configured with the same step and duration, the clock
//! itself can't detect a mismatch.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::bus::{BusError, SimBus};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Step used when the coordinator doesn't provide one.
pub const DEFAULT_STEP_S: f64 = 0.02;

/// Number of nanoseconds in a second
const NANOS_PER_SECOND: f64 = 1e9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Lock-step clock of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    step_ns: u64,

    total_ns: u64,

    /// Time the next call to `advance` will wait for
    next_expected_ns: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClock {
    /// Create a clock from the timing reported by the bus, starting at the bus's current time.
    pub fn new<B: SimBus + ?Sized>(bus: &B) -> Self {
        let step_ns = match bus.step_ns() {
            0 => secs_to_ns(DEFAULT_STEP_S),
            s => s,
        };

        Self {
            step_ns,
            total_ns: bus.total_ns(),
            next_expected_ns: bus.current_time_ns(),
        }
    }

    /// Step size in seconds.
    pub fn step_s(&self) -> f64 {
        self.step_ns as f64 / NANOS_PER_SECOND
    }

    /// Step size in nanoseconds.
    pub fn step_ns(&self) -> u64 {
        self.step_ns
    }

    /// Total duration of the run in seconds.
    pub fn total_s(&self) -> f64 {
        self.total_ns as f64 / NANOS_PER_SECOND
    }

    /// Current time of the bus in seconds.
    pub fn current_time_s<B: SimBus + ?Sized>(&self, bus: &B) -> f64 {
        bus.current_time_ns() as f64 / NANOS_PER_SECOND
    }

    /// True while the run hasn't reached its total duration.
    pub fn is_running<B: SimBus + ?Sized>(&self, bus: &B) -> bool {
        bus.current_time_ns() < self.total_ns
    }

    /// Advance the bus to the end of the current step, blocking until it gets there.
    ///
    /// If the bus has drifted past the target the advance is skipped.
    pub fn advance<B: SimBus + ?Sized>(&mut self, bus: &mut B) -> Result<(), BusError> {
        self.next_expected_ns += self.step_ns;

        let delta_ns = self.next_expected_ns as i64 - bus.current_time_ns() as i64;

        bus.advance_by(delta_ns)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The step to integrate or differentiate with, substituting [`DEFAULT_STEP_S`] for non-positive
/// steps.
pub fn effective_step_s(step_s: f64) -> f64 {
    if step_s > 0.0 {
        step_s
    } else {
        DEFAULT_STEP_S
    }
}

/// Convert seconds into whole nanoseconds, negative or non-finite values give zero.
pub fn secs_to_ns(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * NANOS_PER_SECOND).round() as u64
    } else {
        0
    }
}
