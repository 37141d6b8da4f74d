//! labtrack-api: HTTP boundary for the Labtrack sample tracker.
//!
//! Translates JSON requests into repository and split calls and maps every
//! failure onto `{"message": ...}` with a 400, 404, or 500 status.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use handlers::AppState;
pub use routes::router;
