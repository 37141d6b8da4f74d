//! Request handlers.
//!
//! Handlers are generic over the repository so the same router serves both
//! the Neo4j store and the in-memory graph.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use labtrack_core::{Process, Sample, SplitConfig};
use labtrack_graph::EntityRepository;
use labtrack_split::SplitOrchestrator;

use crate::dto::{
    optional_body, CreateProcessRequest, CreateSampleRequest, HealthResponse, SplitEventResponse,
    SplitRequest,
};
use crate::error::ApiError;

/// Shared handler state: the repository and a split orchestrator over it.
pub struct AppState<R> {
    pub repo: Arc<R>,
    pub splitter: SplitOrchestrator<R>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            splitter: self.splitter.clone(),
        }
    }
}

impl<R: EntityRepository> AppState<R> {
    pub fn new(repo: Arc<R>, split: &SplitConfig) -> Self {
        let splitter = SplitOrchestrator::new(Arc::clone(&repo)).with_config(split);
        Self { repo, splitter }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_samples<R: EntityRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<Sample>>, ApiError> {
    Ok(Json(state.repo.list_samples().await?))
}

pub async fn create_sample<R: EntityRepository>(
    State(state): State<AppState<R>>,
    body: Bytes,
) -> Result<Json<Sample>, ApiError> {
    let request: CreateSampleRequest = optional_body(&body)?;
    if let Some(uid) = &request.uid {
        tracing::debug!(supplied_uid = %uid, "Ignoring client-supplied sample uid");
    }

    let sample = state.repo.create_sample().await?;
    tracing::info!(sample_uid = %sample.uid, "Sample created");
    Ok(Json(sample))
}

pub async fn list_processes<R: EntityRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<Process>>, ApiError> {
    Ok(Json(state.repo.list_processes().await?))
}

/// Create a process and attach it to the listed samples.
///
/// Every uid is parsed before anything is written. An unknown sample is only
/// discovered while linking, so the process and any earlier links remain.
pub async fn create_process<R: EntityRepository>(
    State(state): State<AppState<R>>,
    body: Bytes,
) -> Result<Json<Process>, ApiError> {
    let request: CreateProcessRequest = optional_body(&body)?;
    let samples = request.sample_ids()?;

    let process = state.repo.create_process().await?;
    for (linked, sample) in samples.iter().enumerate() {
        if let Err(e) = state.repo.connect_sample_process(*sample, process.uid).await {
            tracing::warn!(
                process_uid = %process.uid,
                sample_uid = %sample,
                linked,
                error = %e,
                "Process created but sample link failed"
            );
            return Err(e.into());
        }
    }

    let process = state.repo.get_process(process.uid).await?;
    tracing::info!(
        process_uid = %process.uid,
        samples = process.samples.len(),
        "Process created"
    );
    Ok(Json(process))
}

pub async fn split_sample<R: EntityRepository>(
    State(state): State<AppState<R>>,
    payload: Result<Json<SplitRequest>, JsonRejection>,
) -> Result<Json<SplitEventResponse>, ApiError> {
    let Json(request) = payload?;
    let source = request.original_sample.parse()?;
    let target_count = request.target_count()?;

    let event = state.splitter.split_sample(source, target_count).await?;
    Ok(Json(SplitEventResponse::try_from(event)?))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use labtrack_core::{NodeLabel, ProcessId, SampleId};
    use labtrack_graph::MemoryGraph;
    use serde_json::{json, Value};

    use super::*;

    fn state() -> AppState<MemoryGraph> {
        AppState::new(Arc::new(MemoryGraph::new()), &SplitConfig::default())
    }

    fn body(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    async fn error_body(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn split_payload(uid: String, target_count: i64) -> Result<Json<SplitRequest>, JsonRejection> {
        Ok(Json(
            serde_json::from_value(json!({
                "original_sample": {"uid": uid},
                "target_count": target_count,
            }))
            .unwrap(),
        ))
    }

    #[tokio::test]
    async fn create_sample_accepts_empty_body_and_ignores_uid() {
        let state = state();

        let Json(first) = create_sample(State(state.clone()), Bytes::new())
            .await
            .unwrap();
        let supplied = SampleId::new();
        let Json(second) = create_sample(
            State(state.clone()),
            body(json!({"uid": supplied.to_string()})),
        )
        .await
        .unwrap();

        assert_ne!(second.uid, supplied);
        let Json(all) = list_samples(State(state)).await.unwrap();
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn malformed_sample_body_is_400_with_message() {
        let err = create_sample(State(state()), Bytes::from_static(b"{not json"))
            .await
            .unwrap_err();
        let (status, value) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["message"].is_string());
    }

    #[tokio::test]
    async fn create_process_links_listed_samples() {
        let state = state();
        let a = state.repo.create_sample().await.unwrap();
        let b = state.repo.create_sample().await.unwrap();

        let Json(process) = create_process(
            State(state.clone()),
            body(json!({"samples": [{"uid": a.uid.to_string()}, {"uid": b.uid.to_string()}]})),
        )
        .await
        .unwrap();

        assert_eq!(process.samples, vec![a, b]);
        let processes = state.repo.list_processes_of_sample(a.uid).await.unwrap();
        assert_eq!(processes, vec![process.uid]);
    }

    #[tokio::test]
    async fn create_process_without_samples() {
        let state = state();
        let Json(process) = create_process(State(state.clone()), Bytes::new())
            .await
            .unwrap();
        assert!(process.samples.is_empty());

        let Json(all) = list_processes(State(state)).await.unwrap();
        assert_eq!(all, vec![process]);
    }

    #[tokio::test]
    async fn create_process_with_bad_uid_writes_nothing() {
        let state = state();
        let err = create_process(
            State(state.clone()),
            body(json!({"samples": [{"uid": "not-a-uuid"}]})),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.repo.count_nodes(NodeLabel::Process).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_process_with_unknown_sample_is_404_after_create() {
        let state = state();
        let err = create_process(
            State(state.clone()),
            body(json!({"samples": [{"uid": SampleId::new().to_string()}]})),
        )
        .await
        .unwrap_err();

        let (status, value) = error_body(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(value["message"]
            .as_str()
            .unwrap()
            .starts_with("Sample not found"));
        assert_eq!(state.repo.count_nodes(NodeLabel::Process).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn split_returns_event_with_targets_and_processes() {
        let state = state();
        let source = state.repo.create_sample().await.unwrap();
        let mut processes = HashSet::new();
        for _ in 0..2 {
            let p = state.repo.create_process().await.unwrap();
            state
                .repo
                .connect_sample_process(source.uid, p.uid)
                .await
                .unwrap();
            processes.insert(p.uid);
        }

        let Json(event) = split_sample(
            State(state.clone()),
            split_payload(source.uid.to_string(), 3),
        )
        .await
        .unwrap();

        assert_eq!(event.original_sample, source);
        assert_eq!(event.target_samples.len(), 2);
        for target in &event.target_samples {
            let got: HashSet<ProcessId> = state
                .repo
                .list_processes_of_sample(target.uid)
                .await
                .unwrap()
                .into_iter()
                .collect();
            assert_eq!(got, processes);
        }

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["original_sample"]["uid"], source.uid.to_string());
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn split_rejects_small_counts_as_400() {
        let state = state();
        let source = state.repo.create_sample().await.unwrap();

        for count in [-5, 0, 1] {
            let err = split_sample(
                State(state.clone()),
                split_payload(source.uid.to_string(), count),
            )
            .await
            .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(
            state.repo.count_nodes(NodeLabel::SplitEvent).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn split_of_unknown_sample_is_404() {
        let err = split_sample(State(state()), split_payload(SampleId::new().to_string(), 3))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn split_with_malformed_uid_is_400() {
        let err = split_sample(State(state()), split_payload("123".into(), 3))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
    }
}
