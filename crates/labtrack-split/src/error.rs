//! Error types for the labtrack-split crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("Graph error: {0}")]
    Graph(#[from] labtrack_graph::GraphError),
}

impl SplitError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Graph(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
