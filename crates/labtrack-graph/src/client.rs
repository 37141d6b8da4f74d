//! Neo4j connection management and shared graph client.

use neo4rs::{query, ConfigBuilder, Graph, Query};

use labtrack_core::{NodeLabel, ProcessId, SampleId, SplitEventId, StoreConfig};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("{label} not found: {uid}")]
    NotFound { label: NodeLabel, uid: String },

    #[error(
        "Split event {split_uid} already has original sample {existing}; refusing to link {requested}"
    )]
    Cardinality {
        split_uid: SplitEventId,
        existing: SampleId,
        requested: SampleId,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GraphError {
    pub fn sample_not_found(uid: SampleId) -> Self {
        Self::NotFound {
            label: NodeLabel::Sample,
            uid: uid.to_string(),
        }
    }

    pub fn process_not_found(uid: ProcessId) -> Self {
        Self::NotFound {
            label: NodeLabel::Process,
            uid: uid.to_string(),
        }
    }

    pub fn split_not_found(uid: SplitEventId) -> Self {
        Self::NotFound {
            label: NodeLabel::SplitEvent,
            uid: uid.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given store configuration.
    pub async fn connect(config: &StoreConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.endpoint)
            .user(&config.credentials.user)
            .password(&config.credentials.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(endpoint = %config.endpoint, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Install uniqueness constraints on `uid` for every node label.
    ///
    /// Safe to call on every startup.
    pub async fn ensure_constraints(&self) -> Result<(), GraphError> {
        for label in [NodeLabel::Sample, NodeLabel::Process, NodeLabel::SplitEvent] {
            let name = format!("{}_uid", label.as_str().to_lowercase());
            let cypher = format!(
                "CREATE CONSTRAINT {name} IF NOT EXISTS
                 FOR (n:{label}) REQUIRE n.uid IS UNIQUE"
            );
            self.run(query(&cypher)).await?;
        }
        tracing::debug!("Uniqueness constraints in place");
        Ok(())
    }

    /// Execute a write-only query (CREATE, MERGE, DELETE, SET).
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a read query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        Ok(stream.next().await?)
    }
}
