//! Cascade transition executor.
//!
//! Orchestrates a processing session: load reference data once, fetch the
//! changed record and its parent, run every candidate rule through the
//! matcher, apply the implied parent transitions, and continue up the
//! hierarchy when a fired rule asks for it.

#![deny(unsafe_code)]

mod executor;

pub use cascade_engine::{EngineError, EngineResult};
pub use executor::{AppliedTransition, TransitionExecutor};
