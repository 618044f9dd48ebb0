use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::graph::Graph;
use crate::model::NodeId;

/// Result of a successful shortest-path query.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    /// Ordered node identifiers from start to goal, inclusive.
    pub steps: Vec<NodeId>,
    /// Total road distance in metres.
    pub distance_m: f64,
}

/// Run Dijkstra's algorithm between two nodes.
///
/// Returns `None` when the goal is unreachable; numeric infinity never leaks
/// to callers. The graph is treated as static for the duration of the call.
/// Ties in tentative distance are broken by node identifier so equal-length
/// paths resolve deterministically.
pub fn shortest_path(graph: &Graph, start: &str, goal: &str) -> Option<ShortestPath> {
    if !graph.contains(start) || !graph.contains(goal) {
        return None;
    }
    if start == goal {
        return Some(ShortestPath {
            steps: vec![start.to_string()],
            distance_m: 0.0,
        });
    }

    let mut distances: HashMap<NodeId, f64> = HashMap::new();
    let mut parents: HashMap<NodeId, Option<NodeId>> = HashMap::new();
    let mut queue = BinaryHeap::new();

    distances.insert(start.to_string(), 0.0);
    parents.insert(start.to_string(), None);
    queue.push(QueueEntry::new(start.to_string(), 0.0));

    while let Some(entry) = queue.pop() {
        let best = match distances.get(&entry.node) {
            Some(distance) => *distance,
            None => continue,
        };
        // Stale heap entry for a node we already settled with a shorter path.
        if best < entry.cost.0 {
            continue;
        }

        if entry.node == goal {
            return Some(ShortestPath {
                steps: reconstruct_path(&parents, start, goal),
                distance_m: best,
            });
        }

        for edge in graph.neighbours(&entry.node) {
            let next_cost = best + edge.distance_m;
            if next_cost < *distances.get(&edge.target).unwrap_or(&f64::INFINITY) {
                distances.insert(edge.target.clone(), next_cost);
                parents.insert(edge.target.clone(), Some(entry.node.clone()));
                queue.push(QueueEntry::new(edge.target.clone(), next_cost));
            }
        }
    }

    None
}

fn reconstruct_path(
    parents: &HashMap<NodeId, Option<NodeId>>,
    start: &str,
    goal: &str,
) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut current = Some(goal.to_string());
    while let Some(node) = current {
        path.push(node.clone());
        if node == start {
            break;
        }
        current = parents.get(&node).cloned().flatten();
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: NodeId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
