mod common;

use common::coords;
use curbside_lib::{
    build_graph, shortest_path, Category, EdgeRecord, Network, Point, PointStatus,
};

fn network_point(node: &str) -> Point {
    Point {
        node: node.to_string(),
        name: node.to_string(),
        coordinates: coords(0.0, 0.0),
        category: if node == "Depot" {
            Category::Depot
        } else {
            Category::Residential
        },
        fill: 0,
        status: PointStatus::Active,
        last_emptied_at: None,
    }
}

fn mirrored_edge(network: &mut Network, from: &str, to: &str, distance_m: f64) {
    for (a, b) in [(from, to), (to, from)] {
        network.edges.push(EdgeRecord {
            from: a.to_string(),
            to: b.to_string(),
            distance_m,
            last_fetched_at: "2026-01-01T00:00:00Z".to_string(),
        });
    }
}

/// Fixed five-node graph with known weights:
///
/// Depot -2- Bin1 -2- Bin2
///   \5_____________/  |1
///        Bin1 -6- Bin3 -3- Bin4
fn fixture_network() -> Network {
    let mut network = Network::default();
    for node in ["Depot", "Bin1", "Bin2", "Bin3", "Bin4"] {
        network
            .points
            .insert(node.to_string(), network_point(node));
    }
    mirrored_edge(&mut network, "Depot", "Bin1", 2.0);
    mirrored_edge(&mut network, "Depot", "Bin2", 5.0);
    mirrored_edge(&mut network, "Bin1", "Bin2", 2.0);
    mirrored_edge(&mut network, "Bin1", "Bin3", 6.0);
    mirrored_edge(&mut network, "Bin2", "Bin3", 1.0);
    mirrored_edge(&mut network, "Bin3", "Bin4", 3.0);
    network
}

#[test]
fn dijkstra_finds_the_known_minimal_path() {
    let network = fixture_network();
    let graph = build_graph(&network);

    let found = shortest_path(&graph, "Depot", "Bin4").expect("path exists");
    assert_eq!(found.distance_m, 8.0);
    assert_eq!(found.steps, vec!["Depot", "Bin1", "Bin2", "Bin3", "Bin4"]);

    // Every consecutive pair on the returned path is adjacent in the graph.
    for pair in found.steps.windows(2) {
        assert!(
            graph
                .neighbours(&pair[0])
                .iter()
                .any(|edge| edge.target == pair[1]),
            "{} and {} are not adjacent",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn dijkstra_prefers_the_cheaper_indirect_route() {
    let network = fixture_network();
    let graph = build_graph(&network);

    let found = shortest_path(&graph, "Depot", "Bin3").expect("path exists");
    // Direct Bin1-Bin3 (2+6) loses to Bin1-Bin2-Bin3 (2+2+1).
    assert_eq!(found.distance_m, 5.0);
    assert_eq!(found.steps, vec!["Depot", "Bin1", "Bin2", "Bin3"]);
}

#[test]
fn start_equals_goal_is_a_zero_length_path() {
    let network = fixture_network();
    let graph = build_graph(&network);

    let found = shortest_path(&graph, "Bin2", "Bin2").expect("trivial path");
    assert_eq!(found.distance_m, 0.0);
    assert_eq!(found.steps, vec!["Bin2"]);
}

#[test]
fn unreachable_goal_is_a_structured_absence() {
    let mut network = fixture_network();
    // An isolated bin: present in the point set, no incident edges.
    network
        .points
        .insert("Bin9".to_string(), network_point("Bin9"));
    let graph = build_graph(&network);

    assert!(shortest_path(&graph, "Depot", "Bin9").is_none());
    assert!(shortest_path(&graph, "Bin9", "Depot").is_none());
}

#[test]
fn unknown_nodes_are_not_routable() {
    let network = fixture_network();
    let graph = build_graph(&network);

    assert!(shortest_path(&graph, "Depot", "Missing").is_none());
    assert!(shortest_path(&graph, "Missing", "Depot").is_none());
}
