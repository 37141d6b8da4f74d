//! labtrack-graph: Entity repository for the lab graph.
//!
//! All reads and writes of samples, processes, and split events flow
//! through the [`EntityRepository`] trait. Two stores implement it:
//! [`GraphClient`] over Neo4j, and [`MemoryGraph`], which keeps explicit
//! adjacency maps in process memory.

pub mod client;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod repository;

pub use client::{GraphClient, GraphError};
pub use memory::MemoryGraph;
pub use repository::EntityRepository;
