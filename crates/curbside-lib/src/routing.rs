//! Route assembly for a collection run.
//!
//! This module provides:
//! - [`CollectionPolicy`] - Eligibility threshold for a planning request
//! - [`CollectionPlan`] - Assembled multi-stop route result
//! - [`plan_collection`] - Main entry point for building a route
//!
//! The assembler uses a greedy nearest-unvisited heuristic rather than a
//! full VRP solve: from the depot it repeatedly routes to the closest
//! remaining eligible bin via the shortest-path engine, which keeps the cost
//! per request at O(k^2) shortest-path runs for k eligible bins and makes
//! the resulting tour easy to explain. An unreachable remainder ends the
//! tour early with a usable partial plan instead of failing the request.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::graph::build_graph;
use crate::model::{Network, Point};
use crate::path::{shortest_path, ShortestPath};
use crate::provider::DistanceProvider;

/// Fill percentage at which a bin joins the collection run.
pub const DEFAULT_FILL_THRESHOLD: u8 = 75;

/// Policy applied when selecting eligible bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionPolicy {
    /// Minimum fill percentage for a bin to be collected.
    pub fill_threshold: u8,
}

impl Default for CollectionPolicy {
    fn default() -> Self {
        Self {
            fill_threshold: DEFAULT_FILL_THRESHOLD,
        }
    }
}

/// Assembled route for one collection run. Built fresh per request and
/// never cached.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionPlan {
    /// The depot the run starts from.
    pub depot: Point,
    /// Points to visit, in collection order.
    pub stops: Vec<Point>,
    /// Concatenated driving geometry as `[lng, lat]` pairs, for rendering.
    pub polyline: Vec<[f64; 2]>,
    /// Total planned road distance in metres.
    pub total_distance_m: f64,
}

impl CollectionPlan {
    /// Whether the run has nothing to collect.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Total distance in kilometres.
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_m / 1000.0
    }

    /// Two-decimal kilometre rendering, e.g. `"2.00 km"`.
    pub fn formatted_distance(&self) -> String {
        format!("{:.2} km", self.total_distance_km())
    }
}

/// Assemble a collection route over a network snapshot.
///
/// Fails with [`Error::DepotMissing`] when the snapshot has no depot.
/// When no bin meets the eligibility threshold the result is an explicit
/// empty plan, not an error. Geometry fetches are best-effort per segment:
/// a provider failure contributes an empty segment without aborting the
/// plan.
pub fn plan_collection(
    network: &Network,
    provider: &dyn DistanceProvider,
    policy: &CollectionPolicy,
) -> Result<CollectionPlan> {
    let depot = network.depot().ok_or(Error::DepotMissing)?.clone();

    let mut eligible: Vec<&Point> = network
        .points
        .values()
        .filter(|point| point.is_eligible(policy.fill_threshold))
        .collect();
    // Snapshot points live in a hash map; fix the candidate order so ties
    // in distance resolve the same way on every run.
    eligible.sort_by(|a, b| a.node.cmp(&b.node));

    if eligible.is_empty() {
        info!(threshold = policy.fill_threshold, "no bins require collection");
        return Ok(CollectionPlan {
            depot,
            stops: Vec::new(),
            polyline: Vec::new(),
            total_distance_m: 0.0,
        });
    }

    let graph = build_graph(network);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stops: Vec<Point> = Vec::new();
    let mut polyline: Vec<[f64; 2]> = Vec::new();
    let mut total_distance_m = 0.0;
    let mut current = depot.node.clone();

    while visited.len() < eligible.len() {
        let mut best: Option<(&Point, ShortestPath)> = None;
        let remaining = eligible
            .iter()
            .copied()
            .filter(|point| !visited.contains(point.node.as_str()));
        for candidate in remaining {
            let Some(found) = shortest_path(&graph, &current, &candidate.node) else {
                continue;
            };
            let better = match &best {
                Some((_, incumbent)) => found.distance_m < incumbent.distance_m,
                None => true,
            };
            if better {
                best = Some((candidate, found));
            }
        }

        let Some((next, path)) = best else {
            warn!(
                remaining = eligible.len() - visited.len(),
                "no remaining eligible bin is reachable; returning a partial plan"
            );
            break;
        };

        debug!(from = %current, to = %next.node, distance_m = path.distance_m, "next leg chosen");
        append_leg(network, provider, &depot, &path, &mut stops, &mut polyline);

        total_distance_m += path.distance_m;
        visited.insert(next.node.as_str());
        current = next.node.clone();
    }

    info!(
        stops = stops.len(),
        total_distance_m, "collection plan assembled"
    );
    Ok(CollectionPlan {
        depot,
        stops,
        polyline,
        total_distance_m,
    })
}

/// Fold one winning leg into the plan: record every newly visited non-depot
/// point along the path and fetch best-effort geometry per traversed edge.
fn append_leg(
    network: &Network,
    provider: &dyn DistanceProvider,
    depot: &Point,
    path: &ShortestPath,
    stops: &mut Vec<Point>,
    polyline: &mut Vec<[f64; 2]>,
) {
    for pair in path.steps.windows(2) {
        let (Some(from), Some(to)) = (network.point(&pair[0]), network.point(&pair[1])) else {
            continue;
        };

        if to.node != depot.node && !stops.iter().any(|stop| stop.node == to.node) {
            stops.push(to.clone());
        }

        let segment = provider.route_geometry(&from.coordinates, &to.coordinates);
        if segment.is_empty() {
            debug!(from = %from.node, to = %to.node, "no geometry for segment");
        }
        polyline.extend(segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Coordinates, PointStatus};

    fn bin(node: &str, fill: u8, status: PointStatus) -> Point {
        Point {
            node: node.to_string(),
            name: node.to_string(),
            coordinates: Coordinates { lat: 0.0, lng: 0.0 },
            category: Category::Residential,
            fill,
            status,
            last_emptied_at: None,
        }
    }

    #[test]
    fn default_policy_uses_source_threshold() {
        assert_eq!(CollectionPolicy::default().fill_threshold, 75);
    }

    #[test]
    fn eligibility_requires_active_full_non_depot() {
        assert!(bin("Bin1", 80, PointStatus::Active).is_eligible(75));
        assert!(bin("Bin1", 75, PointStatus::Active).is_eligible(75));
        assert!(!bin("Bin1", 74, PointStatus::Active).is_eligible(75));
        assert!(!bin("Bin1", 90, PointStatus::Inactive).is_eligible(75));

        let mut depot = bin("Depot", 100, PointStatus::Active);
        depot.category = Category::Depot;
        assert!(!depot.is_eligible(75));
    }

    #[test]
    fn formatted_distance_renders_two_decimals() {
        let plan = CollectionPlan {
            depot: bin("Depot", 0, PointStatus::Active),
            stops: Vec::new(),
            polyline: Vec::new(),
            total_distance_m: 2000.0,
        };
        assert_eq!(plan.formatted_distance(), "2.00 km");
    }
}
