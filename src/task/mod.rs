//! Fingerprint-gated task execution
//!
//! A task's effective inputs (command argv, declared files, imported
//! packages) are assembled into an ordered fingerprint input set; the
//! resulting fingerprint keys a completion marker in the cache store. A
//! task runs only when no marker exists for its fingerprint, or when the
//! caller forces it.

pub mod gate;
pub mod inputs;

pub use gate::TaskGate;
pub use inputs::TaskInputs;
