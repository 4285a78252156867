//! # Key performance indicators
//!
//! Reduction of a tracking error sequence into the overshoot, settling time and steady state
//! error of a run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::path::RefCurve;
use util::maths;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Band around the final error within which the error counts as settled.
pub const SETTLING_TOL: f64 = 0.05;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Indicators computed from a tracking error sequence.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    /// Largest absolute error
    pub overshoot: f64,

    /// Index of the first sample from which the error stays settled
    pub settling_time: usize,

    /// Mean error over the last tenth of the run
    pub steady_state_error: f64,
}

/// One row of the results file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct KpiRecord {
    #[serde(rename = "Kp")]
    pub k_p: f64,
    #[serde(rename = "Ki")]
    pub k_i: f64,
    #[serde(rename = "Kd")]
    pub k_d: f64,
    #[serde(rename = "Noise")]
    pub noise: f64,
    #[serde(rename = "Disturbance")]
    pub disturbance: f64,
    #[serde(rename = "Overshoot")]
    pub overshoot: f64,
    #[serde(rename = "SettlingTime")]
    pub settling_time: usize,
    #[serde(rename = "SteadyStateError")]
    pub steady_state_error: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed error of each trajectory sample against the reference curve, trajectory minus
/// reference.
///
/// `None` if the reference curve is empty.
pub fn tracking_errors(trajectory: &[(f64, f64)], ref_curve: &RefCurve) -> Option<Vec<f64>> {
    trajectory
        .iter()
        .map(|(x, y)| ref_curve.y_at(*x).map(|y_ref| y - y_ref))
        .collect()
}

/// The smallest index from which every error stays within `tol` of the final error.
///
/// Gives the length of the sequence if no such index exists, which only happens when the final
/// error isn't a number.
pub fn settling_index(errors: &[f64], tol: f64) -> usize {
    let final_value = match errors.last() {
        Some(f) => *f,
        None => return 0,
    };

    // NaN comparisons fail, so a NaN counts as a violation
    errors
        .iter()
        .rposition(|e| !((e - final_value).abs() <= tol))
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Number of samples at the end of a run averaged into the steady state error.
pub fn steady_state_window(len: usize) -> usize {
    (len / 10).max(1)
}

/// Reduce an error sequence into its indicators, `None` if there are no errors.
pub fn reduce(errors: &[f64]) -> Option<Kpis> {
    if errors.is_empty() {
        return None;
    }

    let overshoot = errors.iter().fold(0.0f64, |acc, e| acc.max(e.abs()));
    let settling_time = settling_index(errors, SETTLING_TOL);

    let window = steady_state_window(errors.len());
    let steady_state_error = maths::mean(&errors[errors.len() - window..])?;

    Some(Kpis {
        overshoot,
        settling_time,
        steady_state_error,
    })
}
