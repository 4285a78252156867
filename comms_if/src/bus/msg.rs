//! # Bus coordinator messages
//!
//! Requests made by a [`BusClient`](super::client::BusClient) and the coordinator's responses.
//! Messages are serialized as JSON, channel frames travel inside them as base64 strings.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::frame;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A request from a participant to the coordinator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BusRequest {
    /// Join the run. Answered with `Timing` once every expected participant has joined.
    Connect { component_id: u32 },

    /// Overwrite the value held by a channel.
    Publish { id: u32, frame: String },

    /// Read the value held by a channel.
    Receive { id: u32 },

    /// Move simulated time forward. Answered with `Time` once every participant has caught up.
    Advance { component_id: u32, delta_ns: i64 },

    /// Leave the run.
    Disconnect { component_id: u32 },
}

/// A response from the coordinator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BusResponse {
    /// Timing configuration of the run
    Timing {
        step_ns: u64,
        total_ns: u64,
        now_ns: u64,
    },

    /// Request accepted
    Ack,

    /// Base64 frame held by a channel, or `None` if it was never published
    Frame(Option<String>),

    /// Current simulated time
    Time { now_ns: u64 },

    /// The request could not be processed
    Error(String),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Encode a value into a base64 channel frame.
pub fn frame_to_b64(value: f64) -> String {
    base64::encode(frame::encode(value))
}

/// Decode a base64 channel frame, `None` if it isn't valid base64 or is too short.
pub fn frame_from_b64(b64: &str) -> Option<f64> {
    base64::decode(b64).ok().and_then(|b| frame::decode(&b))
}
