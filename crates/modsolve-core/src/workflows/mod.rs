//! # Workflows Module
//!
//! High-level entry points that drive a model purely through the abstract
//! interface, the way an external client would:
//!
//! - **Static Solve** ([`static_solve`]) - solve a static model, optionally
//!   perturb one parameter and solve again, and collect labeled value blocks.
//! - **Simulation** ([`simulate`]) - reset a dynamic model, integrate it to a
//!   final time while firing scheduled parameter events, and collect the
//!   output time series.
//!
//! Both report progress through the engine's `ProgressReporter` and return
//! plain data; rendering and file placement are the caller's concern.

pub mod simulate;
pub mod static_solve;
