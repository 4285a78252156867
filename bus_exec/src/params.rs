//! # Bus Coordinator Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BusExecParams {
    /// Step size handed to every participant
    ///
    /// Units: seconds
    pub step_s: f64,

    /// Duration of the run
    ///
    /// Units: seconds
    pub total_s: f64,

    /// Number of participants which must join before time starts
    pub num_participants: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for BusExecParams {
    fn default() -> Self {
        Self {
            step_s: 0.02,
            total_s: 10.0,
            num_participants: 3,
        }
    }
}
