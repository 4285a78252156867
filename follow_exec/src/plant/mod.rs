//! Plant simulator
//!
//! A unicycle model of the vehicle. Each step the latest speed and yaw rate demands are
//! corrupted with gaussian noise, a transient yaw disturbance may kick in, and the pose is
//! integrated forward with an explicit Euler step. The heading is left unwrapped.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod disturbance;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use disturbance::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur in the plant simulator.
#[derive(Debug, thiserror::Error)]
pub enum PlantError {
    #[error("The noise standard deviation must be finite and non-negative, found {0}")]
    InvalidNoiseStd(f64),

    #[error("Cannot build the noise distribution: {0}")]
    NoiseDistError(rand_distr::NormalError),

    #[error("The disturbance probability must be between 0 and 1, found {0}")]
    InvalidDistProb(f64),
}
