//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repositories, calculators and the data source into
//!   use-case level APIs.
//! - Keep callers decoupled from storage and provider details.

pub mod aggregation;
pub mod environment_cache;
pub mod timeline_service;
