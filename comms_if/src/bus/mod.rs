//! # Bus Module
//!
//! The bus is a fixed set of numbered, single-valued channels shared by every participant of a
//! run, together with the clock that keeps those participants in lock-step. Each channel carries
//! one 8-byte float per step, publishing overwrites the previous value, and reading a channel
//! which has never been written (or whose payload can't be read) yields nothing rather than an
//! error.
//!
//! The coordinator which actually owns the channels and the clock is abstracted behind the
//! [`SimBus`] trait. [`client::BusClient`] talks to a coordinator over zmq, while
//! [`mem::MemBus`] keeps everything in memory for single process runs and tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod client;
pub mod frame;
pub mod mem;
pub mod msg;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifier of a channel on the bus.
///
/// Any `u32` is a valid identifier, the associated constants name the channels used by the
/// path following loop.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub struct ChanId(pub u32);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by the coordinator side of the bus.
///
/// Note that a missing or malformed channel value is never an error, see [`SimBus::receive`].
#[derive(thiserror::Error, Debug)]
pub enum BusError {
    #[error("The bus coordinator could not be reached: {0}")]
    Transport(String),

    #[error("The bus coordinator rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected response from the bus coordinator: {0}")]
    UnexpectedResponse(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The narrow interface every participant requires from the external coordinator.
///
/// Times are in nanoseconds of simulated time.
pub trait SimBus {
    /// Publish a value on a channel, overwriting whatever was there before.
    fn publish(&mut self, id: ChanId, value: f64) -> Result<(), BusError>;

    /// Read the latest value published on a channel.
    ///
    /// Returns `None` if the channel has never been written, if the payload is short or
    /// malformed, or if the transport failed. This function never reports an error.
    fn receive(&mut self, id: ChanId) -> Option<f64>;

    /// Read the latest value on a channel, substituting `default` on a miss.
    fn receive_or(&mut self, id: ChanId, default: f64) -> f64 {
        self.receive(id).unwrap_or(default)
    }

    /// The configured step size, or zero if the coordinator didn't provide one.
    fn step_ns(&self) -> u64;

    /// The total duration of the run.
    fn total_ns(&self) -> u64;

    /// The current simulated time.
    fn current_time_ns(&self) -> u64;

    /// Block until simulated time has moved forward by `delta_ns`.
    ///
    /// Zero or negative deltas are a no-op.
    fn advance_by(&mut self, delta_ns: i64) -> Result<(), BusError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ChanId {
    /// Vehicle x position, written by the plant
    pub const X: ChanId = ChanId(12);

    /// Vehicle y position, written by the plant
    pub const Y: ChanId = ChanId(13);

    /// Vehicle heading in radians (unwrapped), written by the plant
    pub const THETA: ChanId = ChanId(14);

    /// Elapsed plant time, written by the plant
    pub const T: ChanId = ChanId(15);

    /// Commanded speed, written by the controller
    pub const V: ChanId = ChanId(16);

    /// Commanded yaw rate, written by the controller
    pub const OMEGA: ChanId = ChanId(17);
}

impl std::fmt::Display for ChanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
