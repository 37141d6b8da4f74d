//! Write operations for the lab graph.
//!
//! Nodes are created with fresh v4 uids. Relationships are written with
//! MERGE so that re-linking the same pair never duplicates an edge.

use chrono::{DateTime, Utc};
use neo4rs::query;

use labtrack_core::{
    NodeLabel, Process, ProcessId, Relation, Sample, SampleId, SplitEvent, SplitEventId,
};

use crate::client::{GraphClient, GraphError};
use crate::queries::parse_uid;

impl GraphClient {
    // ── Node Creation ────────────────────────────────────────────

    /// Create an empty Sample node.
    pub async fn create_sample(&self) -> Result<Sample, GraphError> {
        let uid = SampleId::new();
        let q = query("CREATE (n:Sample {uid: $uid})").param("uid", uid.to_string());
        self.run(q).await?;

        tracing::debug!(sample_uid = %uid, "Sample created");
        Ok(Sample { uid })
    }

    /// Create a Process node with no samples attached.
    pub async fn create_process(&self) -> Result<Process, GraphError> {
        let uid = ProcessId::new();
        let q = query("CREATE (n:Process {uid: $uid})").param("uid", uid.to_string());
        self.run(q).await?;

        tracing::debug!(process_uid = %uid, "Process created");
        Ok(Process {
            uid,
            samples: Vec::new(),
        })
    }

    /// Create a SplitEvent node. The timestamp is stored as RFC 3339.
    pub async fn create_split_event(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<SplitEvent, GraphError> {
        let uid = SplitEventId::new();
        let q = query("CREATE (n:SplitEvent {uid: $uid, timestamp: $timestamp})")
            .param("uid", uid.to_string())
            .param("timestamp", timestamp.to_rfc3339());
        self.run(q).await?;

        tracing::debug!(split_uid = %uid, %timestamp, "Split event created");
        Ok(SplitEvent {
            uid,
            timestamp,
            original_sample: None,
            target_samples: Vec::new(),
        })
    }

    // ── Relationships ────────────────────────────────────────────

    /// Link a process and a sample with both the SAMPLES and PROCESSES edges
    /// in one statement.
    pub async fn connect_sample_process(
        &self,
        sample: SampleId,
        process: ProcessId,
    ) -> Result<(), GraphError> {
        let cypher = format!(
            "MATCH (p:Process {{uid: $process_uid}})
             MATCH (s:Sample {{uid: $sample_uid}})
             MERGE (p)-[:{samples}]->(s)
             MERGE (p)-[:{processes}]->(s)
             RETURN s.uid AS uid",
            samples = Relation::Samples.as_str(),
            processes = Relation::Processes.as_str(),
        );
        let q = query(&cypher)
            .param("process_uid", process.to_string())
            .param("sample_uid", sample.to_string());

        if self.query_one(q).await?.is_some() {
            return Ok(());
        }

        // Nothing matched: report whichever endpoint is missing.
        self.ensure_node(NodeLabel::Sample, &sample.to_string()).await?;
        Err(GraphError::process_not_found(process))
    }

    /// Link the original sample to a split event (SOURCE and SPLITS edges).
    ///
    /// The write only happens when the event has no origin yet or already
    /// has this one.
    pub async fn connect_split_original(
        &self,
        split: SplitEventId,
        sample: SampleId,
    ) -> Result<(), GraphError> {
        let cypher = format!(
            "MATCH (e:SplitEvent {{uid: $split_uid}})
             MATCH (s:Sample {{uid: $sample_uid}})
             OPTIONAL MATCH (other:Sample)-[:{source}]->(e)
             WITH e, s, collect(other.uid) AS existing
             WHERE size(existing) = 0 OR existing = [s.uid]
             MERGE (s)-[:{source}]->(e)
             MERGE (s)-[:{splits}]->(e)
             RETURN s.uid AS uid",
            source = Relation::Source.as_str(),
            splits = Relation::Splits.as_str(),
        );
        let q = query(&cypher)
            .param("split_uid", split.to_string())
            .param("sample_uid", sample.to_string());

        if self.query_one(q).await?.is_some() {
            return Ok(());
        }

        if let Some(existing) = self.original_of(split).await? {
            if existing != sample {
                return Err(GraphError::Cardinality {
                    split_uid: split,
                    existing,
                    requested: sample,
                });
            }
        }
        self.ensure_node(NodeLabel::SplitEvent, &split.to_string()).await?;
        Err(GraphError::sample_not_found(sample))
    }

    /// Link a split event to one of the samples it produced.
    pub async fn connect_split_target(
        &self,
        split: SplitEventId,
        sample: SampleId,
    ) -> Result<(), GraphError> {
        let cypher = format!(
            "MATCH (e:SplitEvent {{uid: $split_uid}})
             MATCH (s:Sample {{uid: $sample_uid}})
             MERGE (e)-[:{targets}]->(s)
             RETURN s.uid AS uid",
            targets = Relation::Targets.as_str(),
        );
        let q = query(&cypher)
            .param("split_uid", split.to_string())
            .param("sample_uid", sample.to_string());

        if self.query_one(q).await?.is_some() {
            return Ok(());
        }

        self.ensure_node(NodeLabel::SplitEvent, &split.to_string()).await?;
        Err(GraphError::sample_not_found(sample))
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// The sample currently linked as the origin of a split event, if any.
    async fn original_of(&self, split: SplitEventId) -> Result<Option<SampleId>, GraphError> {
        let cypher = format!(
            "MATCH (o:Sample)-[:{source}]->(e:SplitEvent {{uid: $split_uid}})
             RETURN o.uid AS uid LIMIT 1",
            source = Relation::Source.as_str(),
        );
        let q = query(&cypher).param("split_uid", split.to_string());

        match self.query_one(q).await? {
            Some(row) => {
                let raw: String = row.get("uid").map_err(|e| {
                    GraphError::Serialization(format!("Failed to read original uid: {e}"))
                })?;
                Ok(Some(parse_uid(&raw)?))
            }
            None => Ok(None),
        }
    }
}
