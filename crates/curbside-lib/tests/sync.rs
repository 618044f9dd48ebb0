mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::{coords, new_bin, new_depot, FakeProvider};
use curbside_lib::{synthesize_edges, Coordinates, DistanceProvider, GraphStore};

/// Wraps a [`FakeProvider`] and counts how many distances it is asked for.
struct MeteredProvider {
    inner: FakeProvider,
    distance_calls: AtomicUsize,
}

impl MeteredProvider {
    fn new(inner: FakeProvider) -> Self {
        Self {
            inner,
            distance_calls: AtomicUsize::new(0),
        }
    }

    fn distance_calls(&self) -> usize {
        self.distance_calls.load(Ordering::SeqCst)
    }
}

impl DistanceProvider for MeteredProvider {
    fn road_distance(&self, from: &Coordinates, to: &Coordinates) -> Option<f64> {
        self.distance_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.road_distance(from, to)
    }

    fn route_geometry(&self, from: &Coordinates, to: &Coordinates) -> Vec<[f64; 2]> {
        self.inner.route_geometry(from, to)
    }
}

#[test]
fn synthesis_connects_a_new_point_to_every_existing_one() {
    let provider = FakeProvider::new()
        .with(coords(0.0, 0.0), coords(1.0, 0.0), 1000.0)
        .with(coords(0.0, 0.0), coords(2.0, 0.0), 2000.0)
        .with(coords(1.0, 0.0), coords(2.0, 0.0), 1000.0);

    let store = GraphStore::open_in_memory().expect("open store");
    store.insert_point(new_depot(0.0, 0.0)).expect("depot");
    store.insert_point(new_bin("Park", 1.0, 0.0, 50)).expect("bin 1");
    synthesize_edges(&store, &provider, "Bin1").expect("synthesize");
    store.insert_point(new_bin("Market", 2.0, 0.0, 50)).expect("bin 2");
    let outcome = synthesize_edges(&store, &provider, "Bin2").expect("synthesize");

    assert_eq!(outcome.created, 2);
    assert_eq!(outcome.existing, 0);
    assert_eq!(outcome.unavailable, 0);
    // Three unordered pairs, two mirrored rows each.
    assert_eq!(store.edges().expect("edges").len(), 6);
}

#[test]
fn synthesis_retry_is_idempotent() {
    let provider = FakeProvider::new().with(coords(0.0, 0.0), coords(1.0, 0.0), 1000.0);

    let store = GraphStore::open_in_memory().expect("open store");
    store.insert_point(new_depot(0.0, 0.0)).expect("depot");
    store.insert_point(new_bin("Park", 1.0, 0.0, 50)).expect("bin");

    let first = synthesize_edges(&store, &provider, "Bin1").expect("first pass");
    assert_eq!(first.created, 1);

    let second = synthesize_edges(&store, &provider, "Bin1").expect("retry");
    assert_eq!(second.created, 0);
    assert_eq!(second.existing, 1);
    assert_eq!(store.edges().expect("edges").len(), 2);
}

#[test]
fn retry_does_not_query_the_provider_for_connected_pairs() {
    let provider = MeteredProvider::new(
        FakeProvider::new().with(coords(0.0, 0.0), coords(1.0, 0.0), 1000.0),
    );

    let store = GraphStore::open_in_memory().expect("open store");
    store.insert_point(new_depot(0.0, 0.0)).expect("depot");
    store.insert_point(new_bin("Park", 1.0, 0.0, 50)).expect("bin");

    synthesize_edges(&store, &provider, "Bin1").expect("first pass");
    let after_first = provider.distance_calls();
    assert_eq!(after_first, 1);

    let second = synthesize_edges(&store, &provider, "Bin1").expect("retry");
    assert_eq!(provider.distance_calls(), after_first);
    assert_eq!(second.existing, 1);
    assert_eq!(second.unavailable, 0);
}

#[test]
fn retry_classifies_connected_pairs_as_existing_when_the_provider_degrades() {
    // First pass with a working provider, retry with one that knows nothing.
    let provider = FakeProvider::new().with(coords(0.0, 0.0), coords(1.0, 0.0), 1000.0);

    let store = GraphStore::open_in_memory().expect("open store");
    store.insert_point(new_depot(0.0, 0.0)).expect("depot");
    store.insert_point(new_bin("Park", 1.0, 0.0, 50)).expect("bin");
    synthesize_edges(&store, &provider, "Bin1").expect("first pass");

    let degraded = FakeProvider::new();
    let retry = synthesize_edges(&store, &degraded, "Bin1").expect("retry");
    assert_eq!(retry.existing, 1);
    assert_eq!(retry.unavailable, 0);
}

#[test]
fn provider_failures_skip_the_pair_without_a_sentinel_edge() {
    // Distance known for Depot<->Bin1 only.
    let provider = FakeProvider::new().with(coords(0.0, 0.0), coords(1.0, 0.0), 1000.0);

    let store = GraphStore::open_in_memory().expect("open store");
    store.insert_point(new_depot(0.0, 0.0)).expect("depot");
    store.insert_point(new_bin("Park", 1.0, 0.0, 50)).expect("bin 1");
    synthesize_edges(&store, &provider, "Bin1").expect("synthesize");
    store.insert_point(new_bin("Market", 2.0, 0.0, 50)).expect("bin 2");

    let outcome = synthesize_edges(&store, &provider, "Bin2").expect("synthesize");
    assert_eq!(outcome.created, 0);
    assert_eq!(outcome.unavailable, 2);

    let edges = store.edges().expect("edges");
    assert_eq!(edges.len(), 2);
    // No zero- or sentinel-weight rows for the failed pairs.
    assert!(edges.iter().all(|edge| edge.distance_m == 1000.0));
    assert!(!edges.iter().any(|edge| edge.from == "Bin2" || edge.to == "Bin2"));
}

#[test]
fn one_failed_pair_does_not_abort_the_rest() {
    // Bin2 can reach Bin1 but not the depot.
    let provider = FakeProvider::new()
        .with(coords(0.0, 0.0), coords(1.0, 0.0), 1000.0)
        .with(coords(1.0, 0.0), coords(2.0, 0.0), 1000.0);

    let store = GraphStore::open_in_memory().expect("open store");
    store.insert_point(new_depot(0.0, 0.0)).expect("depot");
    store.insert_point(new_bin("Park", 1.0, 0.0, 50)).expect("bin 1");
    synthesize_edges(&store, &provider, "Bin1").expect("synthesize");
    store.insert_point(new_bin("Market", 2.0, 0.0, 50)).expect("bin 2");

    let outcome = synthesize_edges(&store, &provider, "Bin2").expect("synthesize");
    assert_eq!(outcome.created, 1);
    assert_eq!(outcome.unavailable, 1);

    let neighbours = store.neighbours("Bin2").expect("neighbours");
    assert_eq!(neighbours, vec![("Bin1".to_string(), 1000.0)]);
}
