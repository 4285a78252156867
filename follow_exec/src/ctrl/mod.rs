//! Path tracking controller
//!
//! Each step the controller reads the vehicle pose, measures its lateral and heading errors
//! against the reference path and commands a speed and yaw rate which bring it back onto the
//! path. The law is a PD on the lateral error, a P on the heading error and a feedforward of the
//! path slope. There is no integral term.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Gain applied to the path slope in the yaw rate feedforward.
pub const SLOPE_FEEDFORWARD_GAIN: f64 = 0.5;

/// Fraction of the nominal speed below which the heading error can't throttle the vehicle.
pub const MIN_SPEED_FRACTION: f64 = 0.3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur in the controller.
#[derive(Debug, thiserror::Error)]
pub enum CtrlError {
    #[error("Controller parameter {0} must be finite, found {1}")]
    NonFiniteParam(&'static str, f64),
}
