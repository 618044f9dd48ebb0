//! Curbside library entry points.
//!
//! This crate is the collection-route planning engine: it persists the graph
//! of collection points and provider-measured road edges, synthesizes edges
//! incrementally as points are added, runs shortest-path queries over an
//! in-memory adjacency view, and assembles a greedy multi-stop collection
//! route from the depot. Higher-level consumers (the CLI) should only depend
//! on the functions exported here instead of reimplementing behavior.

#![deny(warnings)]

pub mod alloc;
pub mod error;
pub mod graph;
pub mod model;
pub mod path;
pub mod provider;
pub mod routing;
pub mod store;
pub mod sync;

pub use alloc::next_node_id;
pub use error::{Error, Result};
pub use graph::{build_graph, Graph};
pub use model::{
    Category, Coordinates, EdgeRecord, Network, NodeId, Point, PointStatus, Report, ReportStatus,
    DEPOT_NODE,
};
pub use path::{shortest_path, ShortestPath};
pub use provider::{DistanceProvider, OrsClient};
pub use routing::{plan_collection, CollectionPlan, CollectionPolicy, DEFAULT_FILL_THRESHOLD};
pub use store::{GraphStore, NewPoint, PointUpdate};
pub use sync::{synthesize_edges, EdgeSynthesis};
