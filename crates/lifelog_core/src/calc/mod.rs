//! Deterministic per-date calculators.
//!
//! # Invariants
//! - No I/O: every function is a pure function of its arguments.
//! - Only `ValidationError` or `ConfigurationError` can be returned.

pub mod astronomy;
pub mod biorhythm;
