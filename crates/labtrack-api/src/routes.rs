//! Route table.

use axum::routing::{get, post};
use axum::Router;

use labtrack_graph::EntityRepository;

use crate::handlers::{self, AppState};

/// Build the service router over `state`.
pub fn router<R: EntityRepository + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/samples",
            get(handlers::list_samples::<R>).post(handlers::create_sample::<R>),
        )
        .route(
            "/processes",
            get(handlers::list_processes::<R>).post(handlers::create_process::<R>),
        )
        .route("/split", post(handlers::split_sample::<R>))
        .with_state(state)
}
