//! Career tracking automation: a job-application deduplication and
//! reconciliation engine.
//!
//! The core is a library, not a service. External collaborators hand
//! fully-formed email data across the boundary; the pipeline normalizes it,
//! matches it against existing application records, classifies the message,
//! and reconciles the result into the authoritative store.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
