//! Analyser parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::path::PathType;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the analyser
///
/// The gains, noise and disturbance only label the KPI record, they must be kept in line with
/// the controller and plant parameters of the run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// The reference path to score against
    pub path_type: PathType,

    /// Length along x over which the reference path is sampled
    ///
    /// Units: meters
    pub path_length: f64,

    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
    pub noise: f64,
    pub disturbance: f64,

    /// File the KPI record is appended to, relative to the software root if not absolute
    pub results_file: String,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            path_type: PathType::Curved,
            path_length: 20.0,
            k_p: 1.5,
            k_i: 0.0,
            k_d: 0.1,
            noise: 0.02,
            disturbance: 0.2,
            results_file: String::from("results.csv"),
        }
    }
}
