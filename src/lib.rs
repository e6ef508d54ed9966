//! Scrivener: idempotent batch generation from YAML descriptors.
//!
//! Descriptor collections (markdown documents, scripts, diagrams) are driven
//! through a pluggable generation backend. Each descriptor is generated once,
//! flagged complete, and persisted so an interrupted run resumes where it
//! stopped. Diagrams get stable keys from a monotone key pool.

pub mod artifact;
pub mod authoring;
pub mod backend;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod keypool;
pub mod labels;
pub mod logging;
pub mod persist;
pub mod pipeline;
pub mod provider;
