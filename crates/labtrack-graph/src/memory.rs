//! In-memory graph store.
//!
//! Keeps the lab graph as explicit adjacency maps: sample→processes and its
//! reverse index, plus the split links seen from both ends. The repository
//! enforces cardinality itself instead of relying on a database schema.
//! Every repository call takes the lock once, so each call is atomic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use labtrack_core::{
    NodeLabel, Process, ProcessId, Sample, SampleId, SampleSplits, SplitEvent, SplitEventId,
};

use crate::client::GraphError;
use crate::repository::EntityRepository;

/// Process-local graph store. Clone is cheap and clones share state.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    state: Arc<RwLock<GraphState>>,
}

#[derive(Default)]
struct GraphState {
    /// Creation order, for stable listings.
    sample_order: Vec<SampleId>,
    process_order: Vec<ProcessId>,
    split_order: Vec<SplitEventId>,

    /// Sample -> processes that acted on it. A key exists for every sample.
    sample_processes: HashMap<SampleId, Vec<ProcessId>>,
    /// Process -> samples it acted on. A key exists for every process.
    process_samples: HashMap<ProcessId, Vec<SampleId>>,

    splits: HashMap<SplitEventId, SplitNode>,
    /// Sample -> split events it originated.
    source_of: HashMap<SampleId, Vec<SplitEventId>>,
    /// Sample -> split events that produced it.
    target_of: HashMap<SampleId, Vec<SplitEventId>>,
}

struct SplitNode {
    timestamp: DateTime<Utc>,
    original: Option<SampleId>,
    targets: Vec<SampleId>,
}

impl GraphState {
    fn require_sample(&self, uid: SampleId) -> Result<(), GraphError> {
        if self.sample_processes.contains_key(&uid) {
            Ok(())
        } else {
            Err(GraphError::sample_not_found(uid))
        }
    }

    fn process(&self, uid: ProcessId) -> Result<Process, GraphError> {
        let samples = self
            .process_samples
            .get(&uid)
            .ok_or_else(|| GraphError::process_not_found(uid))?;
        Ok(Process {
            uid,
            samples: samples.iter().copied().map(Sample::from).collect(),
        })
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityRepository for MemoryGraph {
    async fn create_sample(&self) -> Result<Sample, GraphError> {
        let uid = SampleId::new();
        let mut state = self.state.write().await;
        state.sample_order.push(uid);
        state.sample_processes.insert(uid, Vec::new());
        Ok(Sample { uid })
    }

    async fn get_sample(&self, uid: SampleId) -> Result<Sample, GraphError> {
        self.state.read().await.require_sample(uid)?;
        Ok(Sample { uid })
    }

    async fn list_samples(&self) -> Result<Vec<Sample>, GraphError> {
        let state = self.state.read().await;
        Ok(state.sample_order.iter().copied().map(Sample::from).collect())
    }

    async fn create_process(&self) -> Result<Process, GraphError> {
        let uid = ProcessId::new();
        let mut state = self.state.write().await;
        state.process_order.push(uid);
        state.process_samples.insert(uid, Vec::new());
        Ok(Process {
            uid,
            samples: Vec::new(),
        })
    }

    async fn get_process(&self, uid: ProcessId) -> Result<Process, GraphError> {
        self.state.read().await.process(uid)
    }

    async fn list_processes(&self) -> Result<Vec<Process>, GraphError> {
        let state = self.state.read().await;
        state
            .process_order
            .iter()
            .map(|uid| state.process(*uid))
            .collect()
    }

    async fn connect_sample_process(
        &self,
        sample: SampleId,
        process: ProcessId,
    ) -> Result<(), GraphError> {
        let mut state = self.state.write().await;
        state.require_sample(sample)?;
        let samples = state
            .process_samples
            .get_mut(&process)
            .ok_or_else(|| GraphError::process_not_found(process))?;
        push_unique(samples, sample);

        // Checked above; the reverse index is updated under the same lock.
        if let Some(processes) = state.sample_processes.get_mut(&sample) {
            push_unique(processes, process);
        }
        Ok(())
    }

    async fn list_processes_of_sample(
        &self,
        sample: SampleId,
    ) -> Result<Vec<ProcessId>, GraphError> {
        let state = self.state.read().await;
        state
            .sample_processes
            .get(&sample)
            .cloned()
            .ok_or_else(|| GraphError::sample_not_found(sample))
    }

    async fn create_split_event(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<SplitEvent, GraphError> {
        let uid = SplitEventId::new();
        let mut state = self.state.write().await;
        state.split_order.push(uid);
        state.splits.insert(
            uid,
            SplitNode {
                timestamp,
                original: None,
                targets: Vec::new(),
            },
        );
        Ok(SplitEvent {
            uid,
            timestamp,
            original_sample: None,
            target_samples: Vec::new(),
        })
    }

    async fn get_split_event(&self, uid: SplitEventId) -> Result<SplitEvent, GraphError> {
        let state = self.state.read().await;
        let node = state
            .splits
            .get(&uid)
            .ok_or_else(|| GraphError::split_not_found(uid))?;
        Ok(SplitEvent {
            uid,
            timestamp: node.timestamp,
            original_sample: node.original.map(Sample::from),
            target_samples: node.targets.iter().copied().map(Sample::from).collect(),
        })
    }

    async fn connect_split_original(
        &self,
        split: SplitEventId,
        sample: SampleId,
    ) -> Result<(), GraphError> {
        let mut state = self.state.write().await;
        state.require_sample(sample)?;
        let node = state
            .splits
            .get_mut(&split)
            .ok_or_else(|| GraphError::split_not_found(split))?;

        match node.original {
            Some(existing) if existing == sample => return Ok(()),
            Some(existing) => {
                return Err(GraphError::Cardinality {
                    split_uid: split,
                    existing,
                    requested: sample,
                })
            }
            None => node.original = Some(sample),
        }

        push_unique(state.source_of.entry(sample).or_default(), split);
        Ok(())
    }

    async fn connect_split_target(
        &self,
        split: SplitEventId,
        sample: SampleId,
    ) -> Result<(), GraphError> {
        let mut state = self.state.write().await;
        state.require_sample(sample)?;
        let node = state
            .splits
            .get_mut(&split)
            .ok_or_else(|| GraphError::split_not_found(split))?;
        push_unique(&mut node.targets, sample);
        push_unique(state.target_of.entry(sample).or_default(), split);
        Ok(())
    }

    async fn list_splits_of_sample(&self, sample: SampleId) -> Result<SampleSplits, GraphError> {
        let state = self.state.read().await;
        state.require_sample(sample)?;
        Ok(SampleSplits {
            source_of: state.source_of.get(&sample).cloned().unwrap_or_default(),
            target_of: state.target_of.get(&sample).cloned().unwrap_or_default(),
        })
    }

    async fn count_nodes(&self, label: NodeLabel) -> Result<u64, GraphError> {
        let state = self.state.read().await;
        let count = match label {
            NodeLabel::Sample => state.sample_order.len(),
            NodeLabel::Process => state.process_order.len(),
            NodeLabel::SplitEvent => state.split_order.len(),
        };
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get_sample() {
        let graph = MemoryGraph::new();
        let sample = graph.create_sample().await.unwrap();

        assert_eq!(graph.get_sample(sample.uid).await.unwrap(), sample);
        assert_eq!(graph.list_samples().await.unwrap(), vec![sample]);
        assert_eq!(graph.count_nodes(NodeLabel::Sample).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_sample_is_not_found() {
        let graph = MemoryGraph::new();
        let err = graph.get_sample(SampleId::new()).await.unwrap_err();
        assert!(err.is_not_found());

        let err = graph
            .list_processes_of_sample(SampleId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::NotFound {
                label: NodeLabel::Sample,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn sample_process_link_is_visible_from_both_ends() {
        let graph = MemoryGraph::new();
        let sample = graph.create_sample().await.unwrap();
        let process = graph.create_process().await.unwrap();

        graph
            .connect_sample_process(sample.uid, process.uid)
            .await
            .unwrap();

        assert_eq!(
            graph.list_processes_of_sample(sample.uid).await.unwrap(),
            vec![process.uid]
        );
        assert_eq!(
            graph.get_process(process.uid).await.unwrap().samples,
            vec![sample]
        );
    }

    #[tokio::test]
    async fn relinking_sample_process_is_idempotent() {
        let graph = MemoryGraph::new();
        let sample = graph.create_sample().await.unwrap();
        let process = graph.create_process().await.unwrap();

        for _ in 0..3 {
            graph
                .connect_sample_process(sample.uid, process.uid)
                .await
                .unwrap();
        }

        assert_eq!(
            graph
                .list_processes_of_sample(sample.uid)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(graph.get_process(process.uid).await.unwrap().samples.len(), 1);
    }

    #[tokio::test]
    async fn linking_to_missing_process_leaves_sample_untouched() {
        let graph = MemoryGraph::new();
        let sample = graph.create_sample().await.unwrap();

        let err = graph
            .connect_sample_process(sample.uid, ProcessId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::NotFound {
                label: NodeLabel::Process,
                ..
            }
        ));
        assert!(graph
            .list_processes_of_sample(sample.uid)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn split_original_is_zero_or_one() {
        let graph = MemoryGraph::new();
        let first = graph.create_sample().await.unwrap();
        let second = graph.create_sample().await.unwrap();
        let event = graph.create_split_event(Utc::now()).await.unwrap();

        graph
            .connect_split_original(event.uid, first.uid)
            .await
            .unwrap();
        // Same origin again is a no-op.
        graph
            .connect_split_original(event.uid, first.uid)
            .await
            .unwrap();

        let err = graph
            .connect_split_original(event.uid, second.uid)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::Cardinality { existing, requested, .. }
                if existing == first.uid && requested == second.uid
        ));

        let stored = graph.get_split_event(event.uid).await.unwrap();
        assert_eq!(stored.original_sample, Some(first));
        assert_eq!(
            graph.list_splits_of_sample(first.uid).await.unwrap().source_of,
            vec![event.uid]
        );
        assert!(graph
            .list_splits_of_sample(second.uid)
            .await
            .unwrap()
            .source_of
            .is_empty());
    }

    #[tokio::test]
    async fn split_targets_keep_creation_order() {
        let graph = MemoryGraph::new();
        let event = graph.create_split_event(Utc::now()).await.unwrap();
        let a = graph.create_sample().await.unwrap();
        let b = graph.create_sample().await.unwrap();

        graph.connect_split_target(event.uid, a.uid).await.unwrap();
        graph.connect_split_target(event.uid, b.uid).await.unwrap();
        graph.connect_split_target(event.uid, a.uid).await.unwrap();

        let stored = graph.get_split_event(event.uid).await.unwrap();
        assert_eq!(stored.target_samples, vec![a, b]);
        assert_eq!(
            graph.list_splits_of_sample(b.uid).await.unwrap().target_of,
            vec![event.uid]
        );
    }

    #[tokio::test]
    async fn clones_share_state() {
        let graph = MemoryGraph::new();
        let other = graph.clone();
        let sample = graph.create_sample().await.unwrap();
        assert!(other.get_sample(sample.uid).await.is_ok());
    }
}
