//! Integration tests for labtrack-graph against a live Neo4j instance.
//!
//! These tests require a Neo4j server reachable with the default store config.
//! Run with: cargo test --package labtrack-graph --test integration -- --ignored
//!
//! Skipped automatically if Neo4j is not available.

use chrono::Utc;
use labtrack_core::{NodeLabel, SampleId, StoreConfig};
use labtrack_graph::{EntityRepository, GraphClient, GraphError};

async fn connect_or_skip() -> Option<GraphClient> {
    let config = StoreConfig::default();
    match GraphClient::connect(&config).await {
        Ok(client) => {
            client.ensure_constraints().await.ok()?;
            Some(client)
        }
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            None
        }
    }
}

async fn cleanup(client: &GraphClient, uids: &[String]) {
    let q = neo4rs::query("MATCH (n) WHERE n.uid IN $uids DETACH DELETE n")
        .param("uids", uids.to_vec());
    let _ = client.run(q).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_create_and_get_sample() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let sample = client.create_sample().await.unwrap();
    let fetched = EntityRepository::get_sample(&client, sample.uid).await.unwrap();
    assert_eq!(fetched, sample);

    cleanup(&client, &[sample.uid.to_string()]).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_missing_sample_is_not_found() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let err = client.get_sample(SampleId::new()).await.unwrap_err();
    assert!(matches!(
        err,
        GraphError::NotFound {
            label: NodeLabel::Sample,
            ..
        }
    ));

    let err = client
        .list_processes_of_sample(SampleId::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_sample_process_link_is_idempotent() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let sample = client.create_sample().await.unwrap();
    let process = client.create_process().await.unwrap();

    // Link twice
    client
        .connect_sample_process(sample.uid, process.uid)
        .await
        .unwrap();
    client
        .connect_sample_process(sample.uid, process.uid)
        .await
        .unwrap();

    // Should still be exactly 1 association, visible from both ends
    let processes = client.list_processes_of_sample(sample.uid).await.unwrap();
    assert_eq!(processes, vec![process.uid]);
    let fetched = client.get_process(process.uid).await.unwrap();
    assert_eq!(fetched.samples, vec![sample]);

    let q = neo4rs::query(
        "MATCH (:Process {uid: $p})-[r]->(:Sample {uid: $s}) RETURN count(r) AS cnt",
    )
    .param("p", process.uid.to_string())
    .param("s", sample.uid.to_string());
    let row = client.query_one(q).await.unwrap().unwrap();
    assert_eq!(row.get::<i64>("cnt").unwrap(), 2);

    cleanup(&client, &[sample.uid.to_string(), process.uid.to_string()]).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_split_links_and_cardinality() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let source = client.create_sample().await.unwrap();
    let intruder = client.create_sample().await.unwrap();
    let target = client.create_sample().await.unwrap();
    let now = Utc::now();
    let event = client.create_split_event(now).await.unwrap();

    client
        .connect_split_original(event.uid, source.uid)
        .await
        .unwrap();
    client
        .connect_split_original(event.uid, source.uid)
        .await
        .unwrap();
    client
        .connect_split_target(event.uid, target.uid)
        .await
        .unwrap();

    let err = client
        .connect_split_original(event.uid, intruder.uid)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Cardinality { .. }));

    let stored = client.get_split_event(event.uid).await.unwrap();
    assert_eq!(stored.original_sample, Some(source));
    assert_eq!(stored.target_samples, vec![target]);
    assert_eq!(stored.timestamp, now);

    let splits = client.list_splits_of_sample(source.uid).await.unwrap();
    assert_eq!(splits.source_of, vec![event.uid]);
    let splits = client.list_splits_of_sample(target.uid).await.unwrap();
    assert_eq!(splits.target_of, vec![event.uid]);

    cleanup(
        &client,
        &[
            source.uid.to_string(),
            intruder.uid.to_string(),
            target.uid.to_string(),
            event.uid.to_string(),
        ],
    )
    .await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_count_nodes_tracks_creates() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let before = client.count_nodes(NodeLabel::Process).await.unwrap();
    let process = client.create_process().await.unwrap();
    let after = client.count_nodes(NodeLabel::Process).await.unwrap();
    assert!(after > before);

    cleanup(&client, &[process.uid.to_string()]).await;
}
