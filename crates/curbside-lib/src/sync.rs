//! Edge synthesis: deriving the weighted graph from the point set.
//!
//! Edges are never written by clients directly. They appear as a side effect
//! of point insertion, when this module asks the distance provider for the
//! road distance between the new point and every existing one, and they
//! disappear through the store's cascading delete. Re-running synthesis for
//! a point is safe and is the documented repair path for a damaged store.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::provider::DistanceProvider;
use crate::store::GraphStore;

/// Outcome of one synthesis pass, per existing peer point.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSynthesis {
    /// Pairs for which a fresh edge pair was persisted.
    pub created: usize,
    /// Pairs skipped because the unordered pair already had a distance.
    pub existing: usize,
    /// Pairs skipped because the provider could not furnish a distance.
    pub unavailable: usize,
}

/// Connect a point to every other point in the store.
///
/// Each pair is handled independently: a provider failure for one pair is
/// logged and skipped without aborting the rest, leaving that pair without
/// an edge rather than writing a zero or sentinel weight. The pair-exists
/// check makes retries idempotent.
pub fn synthesize_edges(
    store: &GraphStore,
    provider: &dyn DistanceProvider,
    node: &str,
) -> Result<EdgeSynthesis> {
    let point = store.point(node)?;
    let mut outcome = EdgeSynthesis::default();

    for other in store.points()? {
        if other.node == point.node {
            continue;
        }

        // Already-connected pairs must not cost a provider call on retry.
        if store.edge_exists(&point.node, &other.node)? {
            outcome.existing += 1;
            continue;
        }

        let Some(distance_m) = provider.road_distance(&point.coordinates, &other.coordinates)
        else {
            warn!(
                from = %point.node,
                to = %other.node,
                "provider could not furnish a distance; leaving the pair unconnected"
            );
            outcome.unavailable += 1;
            continue;
        };

        if store.insert_edge_pair(&point.node, &other.node, distance_m)? {
            debug!(from = %point.node, to = %other.node, distance_m, "edge pair created");
            outcome.created += 1;
        } else {
            outcome.existing += 1;
        }
    }

    info!(
        node = %point.node,
        created = outcome.created,
        existing = outcome.existing,
        unavailable = outcome.unavailable,
        "edge synthesis finished"
    );
    Ok(outcome)
}
