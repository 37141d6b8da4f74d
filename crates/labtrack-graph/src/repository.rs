//! The entity repository contract and its Neo4j binding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use labtrack_core::{
    NodeLabel, Process, ProcessId, Sample, SampleId, SampleSplits, SplitEvent, SplitEventId,
};

use crate::client::{GraphClient, GraphError};

/// Typed access to samples, processes, and split events.
///
/// Each call is atomic on its own; nothing groups several calls into one
/// transaction. Lookups of unknown ids fail with [`GraphError::NotFound`].
/// All `connect_*` operations are idempotent.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Allocate an id and persist an empty sample.
    async fn create_sample(&self) -> Result<Sample, GraphError>;

    async fn get_sample(&self, uid: SampleId) -> Result<Sample, GraphError>;

    async fn list_samples(&self) -> Result<Vec<Sample>, GraphError>;

    /// Allocate an id and persist a process with no samples.
    async fn create_process(&self) -> Result<Process, GraphError>;

    /// A process together with every sample it has acted on.
    async fn get_process(&self, uid: ProcessId) -> Result<Process, GraphError>;

    async fn list_processes(&self) -> Result<Vec<Process>, GraphError>;

    /// Link a sample and a process in both directions.
    async fn connect_sample_process(
        &self,
        sample: SampleId,
        process: ProcessId,
    ) -> Result<(), GraphError>;

    /// The complete set of processes associated with a sample right now.
    async fn list_processes_of_sample(&self, sample: SampleId)
        -> Result<Vec<ProcessId>, GraphError>;

    /// Allocate an id and persist a split event stamped with `timestamp`.
    async fn create_split_event(&self, timestamp: DateTime<Utc>)
        -> Result<SplitEvent, GraphError>;

    /// A split event with its original and target samples attached.
    async fn get_split_event(&self, uid: SplitEventId) -> Result<SplitEvent, GraphError>;

    /// Record `sample` as the origin of `split`.
    ///
    /// Fails with [`GraphError::Cardinality`] if a different sample is
    /// already linked as the origin.
    async fn connect_split_original(
        &self,
        split: SplitEventId,
        sample: SampleId,
    ) -> Result<(), GraphError>;

    /// Record `sample` as one of the samples produced by `split`.
    async fn connect_split_target(
        &self,
        split: SplitEventId,
        sample: SampleId,
    ) -> Result<(), GraphError>;

    /// Split events the sample originated or was produced by.
    async fn list_splits_of_sample(&self, sample: SampleId) -> Result<SampleSplits, GraphError>;

    /// Number of nodes carrying `label`.
    async fn count_nodes(&self, label: NodeLabel) -> Result<u64, GraphError>;
}

#[async_trait]
impl EntityRepository for GraphClient {
    async fn create_sample(&self) -> Result<Sample, GraphError> {
        GraphClient::create_sample(self).await
    }

    async fn get_sample(&self, uid: SampleId) -> Result<Sample, GraphError> {
        GraphClient::get_sample(self, uid).await
    }

    async fn list_samples(&self) -> Result<Vec<Sample>, GraphError> {
        GraphClient::list_samples(self).await
    }

    async fn create_process(&self) -> Result<Process, GraphError> {
        GraphClient::create_process(self).await
    }

    async fn get_process(&self, uid: ProcessId) -> Result<Process, GraphError> {
        GraphClient::get_process(self, uid).await
    }

    async fn list_processes(&self) -> Result<Vec<Process>, GraphError> {
        GraphClient::list_processes(self).await
    }

    async fn connect_sample_process(
        &self,
        sample: SampleId,
        process: ProcessId,
    ) -> Result<(), GraphError> {
        GraphClient::connect_sample_process(self, sample, process).await
    }

    async fn list_processes_of_sample(
        &self,
        sample: SampleId,
    ) -> Result<Vec<ProcessId>, GraphError> {
        GraphClient::list_processes_of_sample(self, sample).await
    }

    async fn create_split_event(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<SplitEvent, GraphError> {
        GraphClient::create_split_event(self, timestamp).await
    }

    async fn get_split_event(&self, uid: SplitEventId) -> Result<SplitEvent, GraphError> {
        GraphClient::get_split_event(self, uid).await
    }

    async fn connect_split_original(
        &self,
        split: SplitEventId,
        sample: SampleId,
    ) -> Result<(), GraphError> {
        GraphClient::connect_split_original(self, split, sample).await
    }

    async fn connect_split_target(
        &self,
        split: SplitEventId,
        sample: SampleId,
    ) -> Result<(), GraphError> {
        GraphClient::connect_split_target(self, split, sample).await
    }

    async fn list_splits_of_sample(&self, sample: SampleId) -> Result<SampleSplits, GraphError> {
        GraphClient::list_splits_of_sample(self, sample).await
    }

    async fn count_nodes(&self, label: NodeLabel) -> Result<u64, GraphError> {
        GraphClient::count_nodes(self, label).await
    }
}
