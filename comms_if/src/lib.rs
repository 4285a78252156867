//! # Communications interface crate.
//!
//! Provides the shared bus and clock contract used by every participant of a run, along with the
//! network plumbing used to reach the bus coordinator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Numbered channels, the `SimBus` collaborator interface and its implementations
pub mod bus;

/// Lock-step clock helper driven through a `SimBus`
pub mod clock;

/// Network module
pub mod net;
