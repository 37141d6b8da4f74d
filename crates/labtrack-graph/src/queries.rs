//! Read operations for the lab graph.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use neo4rs::query;

use labtrack_core::{
    NodeLabel, Process, ProcessId, Relation, Sample, SampleId, SampleSplits, SplitEvent,
    SplitEventId,
};

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    // ── Single Node Lookups ──────────────────────────────────────

    /// Get a sample by uid.
    pub async fn get_sample(&self, uid: SampleId) -> Result<Sample, GraphError> {
        self.ensure_node(NodeLabel::Sample, &uid.to_string())
            .await
            .map(|_| Sample { uid })
    }

    /// Get a process and the samples it has acted on.
    pub async fn get_process(&self, uid: ProcessId) -> Result<Process, GraphError> {
        let cypher = format!(
            "MATCH (p:Process {{uid: $uid}})
             OPTIONAL MATCH (p)-[:{samples}]->(s:Sample)
             RETURN p.uid AS uid, collect(s.uid) AS samples",
            samples = Relation::Samples.as_str(),
        );
        let q = query(&cypher).param("uid", uid.to_string());

        match self.query_one(q).await? {
            Some(row) => process_from_row(&row),
            None => Err(GraphError::process_not_found(uid)),
        }
    }

    /// Get a split event with its original and target samples.
    pub async fn get_split_event(&self, uid: SplitEventId) -> Result<SplitEvent, GraphError> {
        let cypher = format!(
            "MATCH (e:SplitEvent {{uid: $uid}})
             OPTIONAL MATCH (o:Sample)-[:{source}]->(e)
             WITH e, collect(o.uid) AS originals
             OPTIONAL MATCH (e)-[:{targets}]->(t:Sample)
             RETURN e.uid AS uid, e.timestamp AS timestamp, originals,
                    collect(t.uid) AS targets",
            source = Relation::Source.as_str(),
            targets = Relation::Targets.as_str(),
        );
        let q = query(&cypher).param("uid", uid.to_string());

        let Some(row) = self.query_one(q).await? else {
            return Err(GraphError::split_not_found(uid));
        };

        let raw_ts = row_string(&row, "timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
            .map_err(|e| GraphError::Serialization(format!("Bad split timestamp {raw_ts}: {e}")))?
            .with_timezone(&Utc);

        let originals = parse_uids::<SampleId>(row_strings(&row, "originals")?)?;
        let targets = parse_uids::<SampleId>(row_strings(&row, "targets")?)?;

        Ok(SplitEvent {
            uid,
            timestamp,
            original_sample: originals.first().copied().map(Sample::from),
            target_samples: targets.into_iter().map(Sample::from).collect(),
        })
    }

    // ── List Queries ─────────────────────────────────────────────

    /// List every sample.
    pub async fn list_samples(&self) -> Result<Vec<Sample>, GraphError> {
        let q = query("MATCH (n:Sample) RETURN n.uid AS uid");

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let uid = parse_uid(&row_string(&row, "uid")?)?;
            results.push(Sample { uid });
        }
        Ok(results)
    }

    /// List every process with its samples.
    pub async fn list_processes(&self) -> Result<Vec<Process>, GraphError> {
        let cypher = format!(
            "MATCH (p:Process)
             OPTIONAL MATCH (p)-[:{samples}]->(s:Sample)
             RETURN p.uid AS uid, collect(s.uid) AS samples",
            samples = Relation::Samples.as_str(),
        );

        let rows = self.query_rows(query(&cypher)).await?;
        rows.iter().map(process_from_row).collect()
    }

    // ── Neighbor Queries ─────────────────────────────────────────

    /// Processes that have acted on a sample.
    pub async fn list_processes_of_sample(
        &self,
        sample: SampleId,
    ) -> Result<Vec<ProcessId>, GraphError> {
        // Grouping on s.uid yields no row at all when the sample is missing.
        let cypher = format!(
            "MATCH (s:Sample {{uid: $uid}})
             OPTIONAL MATCH (p:Process)-[:{processes}]->(s)
             RETURN s.uid AS uid, collect(p.uid) AS processes",
            processes = Relation::Processes.as_str(),
        );
        let q = query(&cypher).param("uid", sample.to_string());

        match self.query_one(q).await? {
            Some(row) => parse_uids(row_strings(&row, "processes")?),
            None => Err(GraphError::sample_not_found(sample)),
        }
    }

    /// Split events a sample originated, and split events that produced it.
    pub async fn list_splits_of_sample(
        &self,
        sample: SampleId,
    ) -> Result<SampleSplits, GraphError> {
        let cypher = format!(
            "MATCH (s:Sample {{uid: $uid}})
             OPTIONAL MATCH (s)-[:{splits}]->(src:SplitEvent)
             WITH s, collect(src.uid) AS source_of
             OPTIONAL MATCH (tgt:SplitEvent)-[:{targets}]->(s)
             RETURN s.uid AS uid, source_of, collect(tgt.uid) AS target_of",
            splits = Relation::Splits.as_str(),
            targets = Relation::Targets.as_str(),
        );
        let q = query(&cypher).param("uid", sample.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(SampleSplits {
                source_of: parse_uids(row_strings(&row, "source_of")?)?,
                target_of: parse_uids(row_strings(&row, "target_of")?)?,
            }),
            None => Err(GraphError::sample_not_found(sample)),
        }
    }

    /// Count nodes with a given label.
    pub async fn count_nodes(&self, label: NodeLabel) -> Result<u64, GraphError> {
        let cypher = format!("MATCH (n:{label}) RETURN count(n) AS cnt");

        match self.query_one(query(&cypher)).await? {
            Some(row) => row_count(&row, "cnt"),
            None => Ok(0),
        }
    }

    /// Fail with `NotFound` unless a node with this label and uid exists.
    pub(crate) async fn ensure_node(&self, label: NodeLabel, uid: &str) -> Result<(), GraphError> {
        let cypher = format!("MATCH (n:{label} {{uid: $uid}}) RETURN n.uid AS uid");
        let q = query(&cypher).param("uid", uid.to_string());

        match self.query_one(q).await? {
            Some(_) => Ok(()),
            None => Err(GraphError::NotFound {
                label,
                uid: uid.to_string(),
            }),
        }
    }
}

// ── Row Helpers ──────────────────────────────────────────────────

fn process_from_row(row: &neo4rs::Row) -> Result<Process, GraphError> {
    let uid = parse_uid(&row_string(row, "uid")?)?;
    let samples = parse_uids::<SampleId>(row_strings(row, "samples")?)?;
    Ok(Process {
        uid,
        samples: samples.into_iter().map(Sample::from).collect(),
    })
}

fn row_string(row: &neo4rs::Row, key: &str) -> Result<String, GraphError> {
    row.get::<String>(key)
        .map_err(|e| GraphError::Serialization(format!("Failed to read {key}: {e}")))
}

fn row_count(row: &neo4rs::Row, key: &str) -> Result<u64, GraphError> {
    let count = row
        .get::<i64>(key)
        .map_err(|e| GraphError::Serialization(format!("Failed to read {key}: {e}")))?;
    u64::try_from(count)
        .map_err(|_| GraphError::Serialization(format!("Negative {key}: {count}")))
}

fn row_strings(row: &neo4rs::Row, key: &str) -> Result<Vec<String>, GraphError> {
    row.get::<Vec<String>>(key)
        .map_err(|e| GraphError::Serialization(format!("Failed to read {key}: {e}")))
}

/// Parse a uid property read back from Neo4j.
pub(crate) fn parse_uid<T>(raw: &str) -> Result<T, GraphError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e: T::Err| GraphError::Serialization(e.to_string()))
}

fn parse_uids<T>(raw: Vec<String>) -> Result<Vec<T>, GraphError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.iter().map(|s| parse_uid(s)).collect()
}
