//! Use cases (interactors) for GentleWake
//!
//! Use cases are thin coordinators that delegate business rules to domain
//! functions and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`AlarmTimeResolver`] - Next-alarm string to absolute local instant

pub mod resolve_alarm;

pub use resolve_alarm::AlarmTimeResolver;
