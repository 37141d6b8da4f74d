//! Point-in-time copies of a sample's process set.

use std::collections::HashSet;

use labtrack_core::{ProcessId, SampleId};
use labtrack_graph::{EntityRepository, GraphError};

/// The processes associated with a sample at the moment of capture.
///
/// Taken once per split and reused for every target, so targets never see
/// changes made to the source after the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSnapshot {
    sample: SampleId,
    processes: Vec<ProcessId>,
}

/// Difference between a snapshot and the live process set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessDrift {
    /// Attached to the sample after the snapshot was taken.
    pub added: Vec<ProcessId>,
    /// Detached from the sample after the snapshot was taken.
    pub removed: Vec<ProcessId>,
}

impl ProcessSnapshot {
    pub async fn capture<R>(repo: &R, sample: SampleId) -> Result<Self, GraphError>
    where
        R: EntityRepository + ?Sized,
    {
        let processes = repo.list_processes_of_sample(sample).await?;
        Ok(Self { sample, processes })
    }

    pub fn sample(&self) -> SampleId {
        self.sample
    }

    pub fn processes(&self) -> &[ProcessId] {
        &self.processes
    }

    /// Compare against a freshly read process set. `None` means no drift.
    pub fn drift(&self, current: &[ProcessId]) -> Option<ProcessDrift> {
        let before: HashSet<_> = self.processes.iter().collect();
        let after: HashSet<_> = current.iter().collect();

        let added: Vec<_> = current
            .iter()
            .filter(|p| !before.contains(p))
            .copied()
            .collect();
        let removed: Vec<_> = self
            .processes
            .iter()
            .filter(|p| !after.contains(p))
            .copied()
            .collect();

        if added.is_empty() && removed.is_empty() {
            None
        } else {
            Some(ProcessDrift { added, removed })
        }
    }
}
