//! Plant simulator parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the plant simulator
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Standard deviation of the noise added to both the speed and yaw rate demands
    pub noise_std: f64,

    /// Magnitude of the yaw rate disturbance
    ///
    /// Units: radians/second
    pub disturbance: f64,

    /// Probability of a disturbance starting on any idle step
    pub dist_prob: f64,

    /// Duration of a disturbance
    ///
    /// Units: seconds
    pub dist_duration_s: f64,

    pub init_x: f64,
    pub init_y: f64,
    pub init_theta: f64,

    /// Seed of the noise and disturbance generator, drawn from the OS if not set
    pub seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            noise_std: 0.02,
            disturbance: 0.2,
            dist_prob: 0.01,
            dist_duration_s: 0.1,
            init_x: 0.0,
            init_y: 0.0,
            init_theta: 0.0,
            seed: None,
        }
    }
}

impl Params {
    /// Build the random generator described by these parameters.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        }
    }
}
