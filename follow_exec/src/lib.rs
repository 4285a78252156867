//! # Path following library.
//!
//! This library holds the three participants of a path following run and the machinery which
//! drives them:
//!
//! - `plant` integrates the vehicle kinematics under noise and transient disturbances,
//! - `ctrl` steers the vehicle back onto the reference path,
//! - `analyser` records the trajectory and reduces it to performance indicators.
//!
//! Participants only ever talk to each other through the channels of a
//! [`SimBus`](comms_if::bus::SimBus), and advance through time in lock-step with a
//! [`SimClock`](comms_if::clock::SimClock).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Analyser - accumulates the trajectory and computes KPIs against the reference path
pub mod analyser;

/// Controller - computes speed and yaw rate commands from the vehicle state
pub mod ctrl;

/// Single process runner - steps every participant over an in-memory bus
pub mod local;

/// Participant loop - drives a participant until the end of the run
pub mod participant;

/// Plant simulator - integrates the vehicle state from the latest command
pub mod plant;

/// Reference path definitions shared by the controller and the analyser
pub mod path;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Component id of the plant on the bus
pub const PLANT_COMPONENT_ID: u32 = 0;

/// Component id of the controller on the bus
pub const CTRL_COMPONENT_ID: u32 = 1;

/// Component id of the analyser on the bus
pub const ANALYSER_COMPONENT_ID: u32 = 2;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Resolve the results file, relative paths being taken from the software root.
pub fn results_path(file: &str) -> Result<std::path::PathBuf, std::env::VarError> {
    let path = std::path::Path::new(file);

    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(util::host::get_sw_root()?.join(path))
    }
}
