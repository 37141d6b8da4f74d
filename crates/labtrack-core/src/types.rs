//! Core domain types for the lab graph.
//!
//! Samples, processes, and split events are nodes in a property graph.
//! Their associations are edges. These types are shared by the graph
//! client, the split orchestrator, and the HTTP boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LabtrackError;

// ── Identifiers ───────────────────────────────────────────────────

/// Unique identifier for a sample node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleId(pub Uuid);

/// Unique identifier for a process node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub Uuid);

/// Unique identifier for a split event node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SplitEventId(pub Uuid);

macro_rules! node_id {
    ($name:ident, $kind:literal) => {
        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = LabtrackError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| LabtrackError::InvalidId {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

node_id!(SampleId, "sample");
node_id!(ProcessId, "process");
node_id!(SplitEventId, "split event");

// ── Entities ──────────────────────────────────────────────────────

/// A tracked specimen. Identity only; everything else is relationships.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sample {
    pub uid: SampleId,
}

impl From<SampleId> for Sample {
    fn from(uid: SampleId) -> Self {
        Self { uid }
    }
}

/// An operation applied to one or more samples.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Process {
    pub uid: ProcessId,
    /// Samples this process has acted on.
    pub samples: Vec<Sample>,
}

/// Immutable record of one sample being divided into several.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitEvent {
    pub uid: SplitEventId,
    /// Assigned once, when the split request is processed.
    pub timestamp: DateTime<Utc>,
    /// Zero-or-one in storage; exactly one once the split has completed.
    pub original_sample: Option<Sample>,
    /// Samples created by the split.
    pub target_samples: Vec<Sample>,
}

/// The split events a sample takes part in, from the sample's side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleSplits {
    /// Events for which the sample was the origin.
    pub source_of: Vec<SplitEventId>,
    /// Events that produced the sample as a target.
    pub target_of: Vec<SplitEventId>,
}

// ── Graph Vocabulary ──────────────────────────────────────────────

/// Node labels in the lab graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Sample,
    Process,
    SplitEvent,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sample => "Sample",
            Self::Process => "Process",
            Self::SplitEvent => "SplitEvent",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types between nodes.
///
/// - `Samples`, `Processes`: `(Process)->(Sample)`, always written as a pair.
/// - `Source`, `Splits`: `(Sample)->(SplitEvent)` for the original sample, written as a pair.
/// - `Targets`: `(SplitEvent)->(Sample)` for each produced sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    Samples,
    Processes,
    Source,
    Splits,
    Targets,
}

impl Relation {
    /// Cypher relationship type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Samples => "SAMPLES",
            Self::Processes => "PROCESSES",
            Self::Source => "SOURCE",
            Self::Splits => "SPLITS",
            Self::Targets => "TARGETS",
        }
    }
}
