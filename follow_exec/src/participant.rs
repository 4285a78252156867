//! # Participant loop
//!
//! Every component of a run is driven the same way: perform one cycle of bus IO and
//! computation, then wait on the clock for the rest of the participants to finish the step.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};

use comms_if::{
    bus::{BusError, ChanId, SimBus},
    clock::SimClock,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A component which takes part in a lock-step run.
pub trait Participant {
    /// Perform one step: read inputs from the bus, process them and publish the outputs.
    ///
    /// A cycle never fails, missing inputs are substituted and failed publishes are logged.
    fn cycle(&mut self, bus: &mut dyn SimBus);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A group of participants cycled one after the other within a single step.
pub struct Lockstep<'a> {
    participants: Vec<&'a mut dyn Participant>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> Lockstep<'a> {
    /// Create a group which cycles `participants` in the given order.
    pub fn new(participants: Vec<&'a mut dyn Participant>) -> Self {
        Self { participants }
    }
}

impl<'a> Participant for Lockstep<'a> {
    fn cycle(&mut self, bus: &mut dyn SimBus) {
        for p in self.participants.iter_mut() {
            p.cycle(bus);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Cycle `participant` until `clock` reaches the end of the run.
///
/// Returns the number of cycles performed. Only a failure of the coordinator itself ends the
/// run early.
pub fn run<B, P>(bus: &mut B, clock: &mut SimClock, participant: &mut P) -> Result<u64, BusError>
where
    B: SimBus,
    P: Participant + ?Sized,
{
    let mut num_cycles = 0u64;

    while clock.is_running(&*bus) {
        participant.cycle(bus);
        num_cycles += 1;

        clock.advance(bus)?;

        debug!(
            "Cycle {} done, time is now {:.3} s",
            num_cycles,
            clock.current_time_s(&*bus)
        );
    }

    Ok(num_cycles)
}

/// Publish `value` on channel `id`, logging rather than propagating a failure.
pub(crate) fn publish_or_warn(bus: &mut dyn SimBus, id: ChanId, value: f64) {
    if let Err(e) = bus.publish(id, value) {
        warn!("Could not publish {} on channel {}: {}", value, id, e);
    }
}
