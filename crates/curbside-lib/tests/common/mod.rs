//! Shared fixtures for curbside-lib integration tests.
#![allow(dead_code)]

use curbside_lib::{Category, Coordinates, DistanceProvider, NewPoint, PointStatus};

pub fn coords(lat: f64, lng: f64) -> Coordinates {
    Coordinates { lat, lng }
}

pub fn new_bin(name: &str, lat: f64, lng: f64, fill: u8) -> NewPoint {
    NewPoint {
        name: name.to_string(),
        coordinates: coords(lat, lng),
        category: Category::Residential,
        fill,
        status: PointStatus::Active,
    }
}

pub fn new_depot(lat: f64, lng: f64) -> NewPoint {
    NewPoint {
        name: "Central depot".to_string(),
        coordinates: coords(lat, lng),
        category: Category::Depot,
        fill: 0,
        status: PointStatus::Active,
    }
}

/// Deterministic stand-in for the road-distance provider. Distances are
/// looked up symmetrically by exact coordinates; unknown pairs degrade the
/// same way the real client does.
#[derive(Debug, Default)]
pub struct FakeProvider {
    entries: Vec<(Coordinates, Coordinates, f64)>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, from: Coordinates, to: Coordinates, distance_m: f64) -> Self {
        self.entries.push((from, to, distance_m));
        self
    }

    fn find(&self, from: &Coordinates, to: &Coordinates) -> Option<f64> {
        self.entries
            .iter()
            .find(|(a, b, _)| (a == from && b == to) || (a == to && b == from))
            .map(|(_, _, distance_m)| *distance_m)
    }
}

impl DistanceProvider for FakeProvider {
    fn road_distance(&self, from: &Coordinates, to: &Coordinates) -> Option<f64> {
        self.find(from, to)
    }

    fn route_geometry(&self, from: &Coordinates, to: &Coordinates) -> Vec<[f64; 2]> {
        if self.find(from, to).is_some() {
            vec![[from.lng, from.lat], [to.lng, to.lat]]
        } else {
            Vec::new()
        }
    }
}
