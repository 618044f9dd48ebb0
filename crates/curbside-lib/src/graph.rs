use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Network, NodeId};

/// Weighted edge within the routing graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub target: NodeId,
    pub distance_m: f64,
}

/// Adjacency view used by the shortest-path engine.
///
/// Built as an owned, transient structure from a store snapshot for each
/// planning request, never kept as long-lived mutable state, so concurrent
/// store mutations cannot leave a stale graph behind.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: Arc<HashMap<NodeId, Vec<Edge>>>,
}

impl Graph {
    /// Return the neighbours of a node. Unknown nodes have none.
    pub fn neighbours(&self, node: &str) -> &[Edge] {
        self.adjacency
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the graph knows the node at all.
    pub fn contains(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }
}

/// Build the adjacency view from a network snapshot.
///
/// The store persists every edge as a mirrored pair of directed rows, so
/// each row is inserted as-is; the sort-and-dedup pass guards against rows
/// duplicated by external tampering. Rows referencing unknown points are
/// dropped rather than propagated into the graph.
pub fn build_graph(network: &Network) -> Graph {
    let mut adjacency: HashMap<NodeId, Vec<Edge>> = HashMap::new();

    for node in network.points.keys() {
        adjacency.entry(node.clone()).or_default();
    }

    for record in &network.edges {
        if !network.points.contains_key(&record.from) || !network.points.contains_key(&record.to)
        {
            continue;
        }
        adjacency
            .entry(record.from.clone())
            .or_default()
            .push(Edge {
                target: record.to.clone(),
                distance_m: record.distance_m,
            });
    }

    for edges in adjacency.values_mut() {
        edges.sort_by(|a, b| {
            a.target
                .cmp(&b.target)
                .then_with(|| a.distance_m.total_cmp(&b.distance_m))
        });
        edges.dedup_by(|a, b| a.target == b.target);
    }

    Graph {
        adjacency: Arc::new(adjacency),
    }
}
