//! # In-memory bus
//!
//! A [`SimBus`] which keeps all channels and the clock in memory. Used when every participant runs
//! inside one process, and as the stand-in coordinator in tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use super::{frame, BusError, ChanId, SimBus};
use crate::clock::secs_to_ns;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An in-memory bus with last-value-wins channel slots.
#[derive(Debug, Clone, Default)]
pub struct MemBus {
    /// Raw frames, keyed by channel
    slots: HashMap<ChanId, Vec<u8>>,

    step_ns: u64,

    total_ns: u64,

    now_ns: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MemBus {
    /// Create a new bus starting at time zero.
    pub fn new(step_ns: u64, total_ns: u64) -> Self {
        Self {
            slots: HashMap::new(),
            step_ns,
            total_ns,
            now_ns: 0,
        }
    }

    /// Create a new bus from a step and duration given in seconds.
    pub fn from_secs(step_s: f64, total_s: f64) -> Self {
        Self::new(secs_to_ns(step_s), secs_to_ns(total_s))
    }

    /// Store a raw frame on a channel, bypassing the frame encoder.
    ///
    /// Useful to simulate short or corrupted payloads.
    pub fn inject_frame(&mut self, id: ChanId, bytes: &[u8]) {
        self.slots.insert(id, bytes.to_vec());
    }
}

impl SimBus for MemBus {
    fn publish(&mut self, id: ChanId, value: f64) -> Result<(), BusError> {
        self.slots.insert(id, frame::encode(value).to_vec());
        Ok(())
    }

    fn receive(&mut self, id: ChanId) -> Option<f64> {
        self.slots.get(&id).and_then(|f| frame::decode(f))
    }

    fn step_ns(&self) -> u64 {
        self.step_ns
    }

    fn total_ns(&self) -> u64 {
        self.total_ns
    }

    fn current_time_ns(&self) -> u64 {
        self.now_ns
    }

    fn advance_by(&mut self, delta_ns: i64) -> Result<(), BusError> {
        if delta_ns > 0 {
            self.now_ns = self.now_ns.saturating_add(delta_ns as u64);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unpublished_channel_returns_default() {
        let mut bus = MemBus::new(20_000_000, 1_000_000_000);

        for id in [0, 12, 13, 17, 255, u32::MAX].iter() {
            assert_eq!(bus.receive(ChanId(*id)), None);
            assert_eq!(bus.receive_or(ChanId(*id), 4.5), 4.5);
        }
    }

    #[test]
    fn test_last_value_wins() {
        let mut bus = MemBus::default();

        bus.publish(ChanId::X, 1.0).unwrap();
        bus.publish(ChanId::X, 2.0).unwrap();

        assert_eq!(bus.receive(ChanId::X), Some(2.0));
        // Reads don't consume the slot
        assert_eq!(bus.receive(ChanId::X), Some(2.0));
        assert_eq!(bus.receive(ChanId::Y), None);
    }

    #[test]
    fn test_malformed_payload_is_no_data() {
        let mut bus = MemBus::default();

        bus.inject_frame(ChanId::V, &[1, 2, 3]);

        assert_eq!(bus.receive(ChanId::V), None);
        assert_eq!(bus.receive_or(ChanId::V, -1.0), -1.0);
    }

    #[test]
    fn test_advance_ignores_non_positive_delta() {
        let mut bus = MemBus::from_secs(0.02, 1.0);

        bus.advance_by(0).unwrap();
        bus.advance_by(-5).unwrap();
        assert_eq!(bus.current_time_ns(), 0);

        bus.advance_by(20_000_000).unwrap();
        assert_eq!(bus.current_time_ns(), 20_000_000);
        assert_eq!(bus.step_ns(), 20_000_000);
        assert_eq!(bus.total_ns(), 1_000_000_000);
    }
}
