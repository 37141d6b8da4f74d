//! labtrack-core: Shared types, configuration, and error handling for Labtrack.
//!
//! This crate provides the foundational types used across all Labtrack components:
//! - Identifiers and entity types (Sample, Process, SplitEvent) for the lab graph
//! - Relationship kinds used to wire entities together
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Credentials, LabtrackConfig, ServerConfig, SplitConfig, StoreBackend, StoreConfig};
pub use error::LabtrackError;
pub use types::{
    NodeLabel, Process, ProcessId, Relation, Sample, SampleId, SampleSplits, SplitEvent,
    SplitEventId,
};
