//! labtrack-split: Sample splitting for the lab graph.
//!
//! Splitting a sample records a split event, creates the new samples, copies
//! the source's process associations onto every one of them, and wires the
//! original/target relationships. All writes go through an
//! [`EntityRepository`] one call at a time.

pub mod error;
pub mod snapshot;

pub use error::SplitError;
pub use snapshot::{ProcessDrift, ProcessSnapshot};

use std::sync::Arc;

use chrono::Utc;
use labtrack_core::{Sample, SampleId, SplitConfig, SplitEvent};
use labtrack_graph::{EntityRepository, GraphError};

/// Smallest accepted target count: the source plus one new sample.
pub const MIN_TARGET_COUNT: u32 = 2;

/// Runs split requests against a repository.
pub struct SplitOrchestrator<R: ?Sized> {
    repo: Arc<R>,
    max_target_count: u32,
}

impl<R: ?Sized> Clone for SplitOrchestrator<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            max_target_count: self.max_target_count,
        }
    }
}

impl<R: EntityRepository + ?Sized> SplitOrchestrator<R> {
    /// Create an orchestrator with the default split limits.
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            max_target_count: SplitConfig::default().max_target_count,
        }
    }

    /// Apply configured split limits.
    pub fn with_config(mut self, config: &SplitConfig) -> Self {
        self.max_target_count = config.max_target_count;
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub fn max_target_count(&self) -> u32 {
        self.max_target_count
    }

    /// Check a requested target count without touching the store.
    pub fn validate_target_count(&self, target_count: u32) -> error::Result<()> {
        if target_count < MIN_TARGET_COUNT {
            return Err(SplitError::InvalidArgument {
                field: "target_count",
                reason: format!("must be at least {MIN_TARGET_COUNT}, got {target_count}"),
            });
        }
        if target_count > self.max_target_count {
            return Err(SplitError::InvalidArgument {
                field: "target_count",
                reason: format!(
                    "must be at most {}, got {target_count}",
                    self.max_target_count
                ),
            });
        }
        Ok(())
    }

    /// Split `source` so that `target_count` samples exist afterwards.
    ///
    /// Creates one split event and `target_count - 1` new samples, each
    /// carrying exactly the processes the source held when the split began.
    ///
    /// Validation and the source lookup happen before any write. After the
    /// split event is created the operation is best-effort: a store failure
    /// leaves the event and the targets created so far in place, and the
    /// error is returned without retry or rollback.
    pub async fn split_sample(
        &self,
        source: SampleId,
        target_count: u32,
    ) -> error::Result<SplitEvent> {
        self.validate_target_count(target_count)?;

        let source = self.repo.get_sample(source).await?;
        let snapshot = ProcessSnapshot::capture(self.repo.as_ref(), source.uid).await?;

        let event = self.repo.create_split_event(Utc::now()).await?;

        let mut created = Vec::new();
        if let Err(e) = self
            .propagate(&event, &source, &snapshot, target_count, &mut created)
            .await
        {
            tracing::error!(
                split_uid = %event.uid,
                source_uid = %source.uid,
                targets_created = created.len(),
                target_count,
                error = %e,
                "Split failed part-way; created entities remain"
            );
            return Err(e.into());
        }

        // Advisory: a failed re-read never fails a persisted split.
        if let Err(e) = self.check_drift(&snapshot).await {
            tracing::warn!(
                split_uid = %event.uid,
                source_uid = %source.uid,
                error = %e,
                "Could not re-read source processes after split"
            );
        }

        let event = self.repo.get_split_event(event.uid).await?;
        tracing::info!(
            split_uid = %event.uid,
            source_uid = %source.uid,
            targets = event.target_samples.len(),
            processes = snapshot.processes().len(),
            "Split complete"
        );
        Ok(event)
    }

    /// Link the source, then create and wire every new target.
    async fn propagate(
        &self,
        event: &SplitEvent,
        source: &Sample,
        snapshot: &ProcessSnapshot,
        target_count: u32,
        created: &mut Vec<SampleId>,
    ) -> Result<(), GraphError> {
        self.repo.connect_split_original(event.uid, source.uid).await?;

        for _ in 1..target_count {
            let target = self.repo.create_sample().await?;
            created.push(target.uid);

            for process in snapshot.processes() {
                self.repo.connect_sample_process(target.uid, *process).await?;
            }
            self.repo.connect_split_target(event.uid, target.uid).await?;
        }
        Ok(())
    }

    /// Warn when the source's processes changed while the split ran.
    async fn check_drift(&self, snapshot: &ProcessSnapshot) -> Result<(), GraphError> {
        let current = self.repo.list_processes_of_sample(snapshot.sample()).await?;

        if let Some(drift) = snapshot.drift(&current) {
            tracing::warn!(
                source_uid = %snapshot.sample(),
                added = ?drift.added,
                removed = ?drift.removed,
                "Source processes changed during split; targets carry the snapshot"
            );
        }
        Ok(())
    }
}
