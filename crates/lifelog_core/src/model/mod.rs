//! Domain model for timeline entries and per-day enrichment.
//!
//! # Responsibility
//! - Define canonical records shared by storage, calculators and aggregation.
//! - Keep validation rules next to the data they constrain.
//!
//! # Invariants
//! - Timeline entries are keyed by (hour slot, category).
//! - Environmental and moon records are keyed by calendar date.

pub mod astro;
pub mod biorhythm;
pub mod entry;
pub mod environment;
pub mod summary;
pub mod validation;
