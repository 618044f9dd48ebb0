use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::alloc::next_node_id;
use crate::error::{Error, Result};
use crate::model::{
    Category, Coordinates, EdgeRecord, Network, NodeId, Point, PointStatus, Report, ReportStatus,
};

/// Minimum similarity before a node identifier is offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.7;
const MAX_SUGGESTIONS: usize = 3;

/// Request to insert a new point. The node identifier is allocated by the
/// store, never supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewPoint {
    pub name: String,
    pub coordinates: Coordinates,
    pub category: Category,
    pub fill: u8,
    pub status: PointStatus,
}

/// Partial update applied to an existing point. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct PointUpdate {
    pub name: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub category: Option<Category>,
    pub fill: Option<u8>,
    pub status: Option<PointStatus>,
    pub last_emptied_at: Option<String>,
}

/// Persisted graph of collection points and provider-measured road edges.
///
/// All access goes through a single mutex-guarded SQLite connection so that
/// the read-allocate-write window during point insertion is serialized:
/// two concurrent insertions can neither allocate the same node identifier
/// nor both pass the depot singleton check.
pub struct GraphStore {
    conn: Mutex<Connection>,
}

impl GraphStore {
    /// Open (creating if necessary) a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opening graph store");
        Self::from_connection(conn)
    }

    /// Open an in-memory store, used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS points (
                node     TEXT PRIMARY KEY,
                name     TEXT NOT NULL,
                lat      REAL NOT NULL,
                lng      REAL NOT NULL,
                category TEXT NOT NULL,
                fill     INTEGER NOT NULL DEFAULT 0,
                status   TEXT NOT NULL DEFAULT 'active',
                last_emptied_at TEXT
            );
            CREATE TABLE IF NOT EXISTS edges (
                from_node       TEXT NOT NULL,
                to_node         TEXT NOT NULL,
                distance_m      REAL NOT NULL,
                last_fetched_at TEXT NOT NULL,
                PRIMARY KEY (from_node, to_node)
            );
            CREATE TABLE IF NOT EXISTS reports (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                node       TEXT NOT NULL,
                message    TEXT NOT NULL,
                status     TEXT NOT NULL DEFAULT 'open',
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new point, allocating its node identifier and enforcing the
    /// single-depot invariant. Edge synthesis is a separate step; see
    /// [`crate::sync::synthesize_edges`].
    pub fn insert_point(&self, new: NewPoint) -> Result<Point> {
        if new.fill > 100 {
            return Err(Error::FillOutOfRange { value: new.fill });
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if new.category == Category::Depot {
            let existing: Option<String> = tx
                .query_row(
                    "SELECT node FROM points WHERE category = 'depot' LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(node) = existing {
                return Err(Error::DepotExists { node });
            }
        }

        let existing_nodes = list_nodes(&tx)?;
        let node = next_node_id(new.category, &existing_nodes);

        tx.execute(
            "INSERT INTO points (node, name, lat, lng, category, fill, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                node,
                new.name,
                new.coordinates.lat,
                new.coordinates.lng,
                new.category,
                new.fill,
                new.status,
            ],
        )?;
        tx.commit()?;

        debug!(%node, category = %new.category, "inserted point");
        Ok(Point {
            node,
            name: new.name,
            coordinates: new.coordinates,
            category: new.category,
            fill: new.fill,
            status: new.status,
            last_emptied_at: None,
        })
    }

    /// Lookup a point by its node identifier.
    pub fn point(&self, node: &str) -> Result<Point> {
        let conn = self.lock();
        fetch_point(&conn, node)
    }

    /// All points, ordered by node identifier.
    pub fn points(&self) -> Result<Vec<Point>> {
        let conn = self.lock();
        list_points(&conn)
    }

    /// Apply a partial update to an existing point. Changing the category to
    /// depot re-checks the singleton invariant.
    pub fn update_point(&self, node: &str, update: PointUpdate) -> Result<Point> {
        if let Some(fill) = update.fill {
            if fill > 100 {
                return Err(Error::FillOutOfRange { value: fill });
            }
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let mut point = fetch_point(&tx, node)?;

        if let Some(category) = update.category {
            if category == Category::Depot && point.category != Category::Depot {
                let existing: Option<String> = tx
                    .query_row(
                        "SELECT node FROM points WHERE category = 'depot' LIMIT 1",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(depot) = existing {
                    return Err(Error::DepotExists { node: depot });
                }
            }
            point.category = category;
        }
        if let Some(name) = update.name {
            point.name = name;
        }
        if let Some(coordinates) = update.coordinates {
            point.coordinates = coordinates;
        }
        if let Some(fill) = update.fill {
            point.fill = fill;
        }
        if let Some(status) = update.status {
            point.status = status;
        }
        if let Some(emptied_at) = update.last_emptied_at {
            point.last_emptied_at = Some(emptied_at);
        }

        tx.execute(
            "UPDATE points SET name = ?2, lat = ?3, lng = ?4, category = ?5, fill = ?6,
             status = ?7, last_emptied_at = ?8 WHERE node = ?1",
            params![
                point.node,
                point.name,
                point.coordinates.lat,
                point.coordinates.lng,
                point.category,
                point.fill,
                point.status,
                point.last_emptied_at,
            ],
        )?;
        tx.commit()?;

        Ok(point)
    }

    /// Delete a point together with its incident edges and reports, in one
    /// transaction so the cascade is atomic from the caller's perspective.
    pub fn delete_point(&self, node: &str) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM points WHERE node = ?1", [node])?;
        if removed == 0 {
            let suggestions = suggestions_for(&tx, node)?;
            return Err(Error::PointNotFound {
                node: node.to_string(),
                suggestions,
            });
        }

        let edges = tx.execute(
            "DELETE FROM edges WHERE from_node = ?1 OR to_node = ?1",
            [node],
        )?;
        let reports = tx.execute("DELETE FROM reports WHERE node = ?1", [node])?;
        tx.commit()?;

        debug!(%node, edges, reports, "deleted point with cascade");
        Ok(())
    }

    /// Persist a bidirectional edge pair between two existing points.
    ///
    /// Idempotent: returns `Ok(false)` without writing when the unordered
    /// pair already has a distance. Both mirrored rows are written inside a
    /// single transaction, so a half-written pair cannot be observed.
    pub fn insert_edge_pair(&self, from: &str, to: &str, distance_m: f64) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        fetch_point(&tx, from)?;
        fetch_point(&tx, to)?;

        if pair_exists(&tx, from, to)? {
            return Ok(false);
        }

        let fetched_at = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO edges (from_node, to_node, distance_m, last_fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![from, to, distance_m, fetched_at],
        )?;
        tx.execute(
            "INSERT INTO edges (from_node, to_node, distance_m, last_fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![to, from, distance_m, fetched_at],
        )?;
        tx.commit()?;

        debug!(%from, %to, distance_m, "persisted edge pair");
        Ok(true)
    }

    /// Whether the unordered pair already has a persisted distance.
    pub fn edge_exists(&self, from: &str, to: &str) -> Result<bool> {
        let conn = self.lock();
        pair_exists(&conn, from, to)
    }

    /// All persisted edge rows (both directions of every pair).
    pub fn edges(&self) -> Result<Vec<EdgeRecord>> {
        let conn = self.lock();
        list_edges(&conn)
    }

    /// Outgoing neighbours of a node with their edge weights.
    pub fn neighbours(&self, node: &str) -> Result<Vec<(NodeId, f64)>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT to_node, distance_m FROM edges WHERE from_node = ?1 ORDER BY to_node",
        )?;
        let rows = stmt.query_map([node], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut neighbours = Vec::new();
        for entry in rows {
            neighbours.push(entry?);
        }
        Ok(neighbours)
    }

    /// File an issue report against an existing point.
    pub fn add_report(&self, node: &str, message: &str) -> Result<Report> {
        let conn = self.lock();
        fetch_point(&conn, node)?;

        let created_at = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO reports (node, message, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![node, message, ReportStatus::Open, created_at],
        )?;
        Ok(Report {
            id: conn.last_insert_rowid(),
            node: node.to_string(),
            message: message.to_string(),
            status: ReportStatus::Open,
            created_at,
        })
    }

    /// Reports filed against a point, oldest first.
    pub fn reports_for(&self, node: &str) -> Result<Vec<Report>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, node, message, status, created_at FROM reports
             WHERE node = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([node], |row| {
            Ok(Report {
                id: row.get(0)?,
                node: row.get(1)?,
                message: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        let mut reports = Vec::new();
        for entry in rows {
            reports.push(entry?);
        }
        Ok(reports)
    }

    /// Read a consistent snapshot of the point set and edge list for one
    /// planning request.
    pub fn snapshot(&self) -> Result<Network> {
        let conn = self.lock();
        let points = list_points(&conn)?;
        let edges = list_edges(&conn)?;

        let mut map = HashMap::new();
        for point in points {
            map.insert(point.node.clone(), point);
        }

        if edges.len() % 2 != 0 {
            warn!(
                rows = edges.len(),
                "edge table holds an odd number of rows; a pair may be half-written"
            );
        }

        Ok(Network { points: map, edges })
    }
}

fn list_nodes(conn: &Connection) -> Result<Vec<NodeId>> {
    let mut stmt = conn.prepare("SELECT node FROM points")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    let mut nodes = Vec::new();
    for entry in rows {
        nodes.push(entry?);
    }
    Ok(nodes)
}

fn list_points(conn: &Connection) -> Result<Vec<Point>> {
    let mut stmt = conn.prepare(
        "SELECT node, name, lat, lng, category, fill, status, last_emptied_at
         FROM points ORDER BY node",
    )?;
    let rows = stmt.query_map([], row_to_point)?;
    let mut points = Vec::new();
    for entry in rows {
        points.push(entry?);
    }
    Ok(points)
}

fn pair_exists(conn: &Connection, from: &str, to: &str) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM edges
             WHERE (from_node = ?1 AND to_node = ?2)
                OR (from_node = ?2 AND to_node = ?1)
             LIMIT 1",
            [from, to],
            |row| row.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn list_edges(conn: &Connection) -> Result<Vec<EdgeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT from_node, to_node, distance_m, last_fetched_at FROM edges
         ORDER BY from_node, to_node",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(EdgeRecord {
            from: row.get(0)?,
            to: row.get(1)?,
            distance_m: row.get(2)?,
            last_fetched_at: row.get(3)?,
        })
    })?;
    let mut edges = Vec::new();
    for entry in rows {
        edges.push(entry?);
    }
    Ok(edges)
}

fn fetch_point(conn: &Connection, node: &str) -> Result<Point> {
    let point = conn
        .query_row(
            "SELECT node, name, lat, lng, category, fill, status, last_emptied_at
             FROM points WHERE node = ?1",
            [node],
            row_to_point,
        )
        .optional()?;

    match point {
        Some(point) => Ok(point),
        None => {
            let suggestions = suggestions_for(conn, node)?;
            Err(Error::PointNotFound {
                node: node.to_string(),
                suggestions,
            })
        }
    }
}

fn suggestions_for(conn: &Connection, node: &str) -> Result<Vec<String>> {
    let candidates = list_nodes(conn)?;
    let mut scored: Vec<(f64, String)> = candidates
        .into_iter()
        .map(|candidate| (strsim::jaro_winkler(node, &candidate), candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    Ok(scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate)
        .collect())
}

fn row_to_point(row: &Row<'_>) -> rusqlite::Result<Point> {
    Ok(Point {
        node: row.get(0)?,
        name: row.get(1)?,
        coordinates: Coordinates {
            lat: row.get(2)?,
            lng: row.get(3)?,
        },
        category: row.get(4)?,
        fill: row.get(5)?,
        status: row.get(6)?,
        last_emptied_at: row.get(7)?,
    })
}
