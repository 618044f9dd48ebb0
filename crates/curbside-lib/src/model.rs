use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::Serialize;

use crate::error::Error;

/// Textual identifier assigned to a point by the node allocator
/// (`"Depot"`, `"Bin1"`, `"Bin2"`, ...).
pub type NodeId = String;

/// Reserved identifier for the single depot point.
pub const DEPOT_NODE: &str = "Depot";

/// Geographic coordinate of a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Category assigned to a point. `Depot` is reserved for the single depot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Depot,
    Residential,
    School,
    Hospital,
    Commercial,
    Office,
    Public,
}

impl Category {
    /// Stable textual form used for storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Depot => "depot",
            Category::Residential => "residential",
            Category::School => "school",
            Category::Hospital => "hospital",
            Category::Commercial => "commercial",
            Category::Office => "office",
            Category::Public => "public",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "depot" => Ok(Category::Depot),
            "residential" => Ok(Category::Residential),
            "school" => Ok(Category::School),
            "hospital" => Ok(Category::Hospital),
            "commercial" => Ok(Category::Commercial),
            "office" => Ok(Category::Office),
            "public" => Ok(Category::Public),
            other => Err(Error::UnknownCategory {
                value: other.to_string(),
            }),
        }
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Category::from_str(text).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// Activity status of a point. Inactive points never join a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    Active,
    Inactive,
}

impl PointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointStatus::Active => "active",
            PointStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for PointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(PointStatus::Active),
            "inactive" => Ok(PointStatus::Inactive),
            other => Err(Error::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl ToSql for PointStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PointStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        PointStatus::from_str(text).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A depot or bin location in the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub node: NodeId,
    pub name: String,
    pub coordinates: Coordinates,
    pub category: Category,
    /// Fill percentage, 0-100.
    pub fill: u8,
    pub status: PointStatus,
    /// RFC 3339 timestamp of the last collection, if any.
    pub last_emptied_at: Option<String>,
}

impl Point {
    /// Whether this point is the depot.
    pub fn is_depot(&self) -> bool {
        self.category == Category::Depot
    }

    /// Whether the point should join a collection run at the given
    /// threshold: active, non-depot, and at least that full.
    pub fn is_eligible(&self, fill_threshold: u8) -> bool {
        !self.is_depot() && self.status == PointStatus::Active && self.fill >= fill_threshold
    }
}

/// Persisted directed edge row. Edges are written in mirrored pairs with
/// equal distance, so every row has a reverse counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    pub from: NodeId,
    pub to: NodeId,
    /// Road travel distance in metres.
    pub distance_m: f64,
    /// RFC 3339 timestamp of the last successful provider measurement.
    pub last_fetched_at: String,
}

/// Status of an issue report filed against a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportStatus {
    Open,
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "open",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(ReportStatus::Open),
            "in_progress" => Ok(ReportStatus::InProgress),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(Error::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl ToSql for ReportStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReportStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        ReportStatus::from_str(text).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// Issue report filed by a citizen against a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: i64,
    pub node: NodeId,
    pub message: String,
    pub status: ReportStatus,
    pub created_at: String,
}

/// In-memory snapshot of the persisted graph, read once per planning
/// request. Never held as long-lived state across mutations.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub points: HashMap<NodeId, Point>,
    pub edges: Vec<EdgeRecord>,
}

impl Network {
    /// Lookup a point by its node identifier.
    pub fn point(&self, node: &str) -> Option<&Point> {
        self.points.get(node)
    }

    /// The depot point, if one exists in the snapshot.
    pub fn depot(&self) -> Option<&Point> {
        self.points.values().find(|point| point.is_depot())
    }
}
