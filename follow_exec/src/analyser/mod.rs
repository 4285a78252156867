//! Trajectory analyser
//!
//! The analyser only listens. It records the vehicle's `(x, y)` each step and, once the run is
//! over, scores the trajectory against a sampled copy of the reference path.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod kpi;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use kpi::KpiRecord;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur in the analyser.
#[derive(Debug, thiserror::Error)]
pub enum AnalyserError {
    #[error("The reference path length must be positive and finite, found {0}")]
    InvalidPathLength(f64),
}
