use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use curbside_lib::{
    plan_collection, synthesize_edges, Category, CollectionPolicy, Coordinates, GraphStore,
    NewPoint, OrsClient, PointStatus, PointUpdate, DEFAULT_FILL_THRESHOLD,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Curbside collection-route planning utilities")]
struct Cli {
    /// Override the store database path.
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a point and synthesize its road edges.
    Add {
        /// Display name of the location.
        #[arg(long)]
        name: String,
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        /// Point category (depot, residential, school, hospital, commercial, office, public).
        #[arg(long)]
        category: String,
        /// Initial fill percentage (0-100).
        #[arg(long, default_value_t = 0)]
        fill: u8,
        /// Initial status (active or inactive).
        #[arg(long, default_value = "active")]
        status: String,
    },
    /// List all points.
    List,
    /// Show a single point.
    Show { node: String },
    /// Update fields of an existing point.
    Update {
        node: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        lat: Option<f64>,
        #[arg(long)]
        lng: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        fill: Option<u8>,
        #[arg(long)]
        status: Option<String>,
        /// Record that the bin was just collected.
        #[arg(long)]
        emptied_now: bool,
    },
    /// Remove a point together with its edges and reports.
    Remove { node: String },
    /// List the persisted road edges.
    Edges,
    /// File an issue report against a point.
    Report {
        node: String,
        #[arg(long)]
        message: String,
    },
    /// List the reports filed against a point.
    Reports { node: String },
    /// Assemble a collection route from the depot over all full bins.
    Plan {
        /// Minimum fill percentage for a bin to be collected.
        #[arg(long, default_value_t = DEFAULT_FILL_THRESHOLD)]
        threshold: u8,
        /// Emit the plan as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let store_path = resolve_store_path(cli.store)?;

    match cli.command {
        Command::Add {
            name,
            lat,
            lng,
            category,
            fill,
            status,
        } => handle_add(&store_path, name, lat, lng, &category, fill, &status),
        Command::List => handle_list(&store_path),
        Command::Show { node } => handle_show(&store_path, &node),
        Command::Update {
            node,
            name,
            lat,
            lng,
            category,
            fill,
            status,
            emptied_now,
        } => handle_update(
            &store_path,
            &node,
            name,
            lat,
            lng,
            category,
            fill,
            status,
            emptied_now,
        ),
        Command::Remove { node } => handle_remove(&store_path, &node),
        Command::Edges => handle_edges(&store_path),
        Command::Report { node, message } => handle_report(&store_path, &node, &message),
        Command::Reports { node } => handle_reports(&store_path, &node),
        Command::Plan { threshold, json } => handle_plan(&store_path, threshold, json),
    }
}

fn handle_add(
    store_path: &Path,
    name: String,
    lat: f64,
    lng: f64,
    category: &str,
    fill: u8,
    status: &str,
) -> Result<()> {
    let store = open_store(store_path)?;
    let point = store
        .insert_point(NewPoint {
            name,
            coordinates: Coordinates { lat, lng },
            category: Category::from_str(category)?,
            fill,
            status: PointStatus::from_str(status)?,
        })
        .context("failed to insert the point")?;

    let provider = OrsClient::from_env().context("failed to build the provider client")?;
    let outcome = synthesize_edges(&store, &provider, &point.node)
        .context("failed to synthesize edges for the new point")?;

    println!("Added {} ({})", point.node, point.name);
    println!(
        "Edges: {} created, {} already present, {} unavailable",
        outcome.created, outcome.existing, outcome.unavailable
    );
    Ok(())
}

fn handle_list(store_path: &Path) -> Result<()> {
    let store = open_store(store_path)?;
    let points = store.points().context("failed to list points")?;
    if points.is_empty() {
        println!("No points in the store.");
        return Ok(());
    }
    for point in points {
        println!(
            "{} {} ({}) fill {}% {} at ({:.5}, {:.5})",
            point.node,
            point.category,
            point.name,
            point.fill,
            point.status,
            point.coordinates.lat,
            point.coordinates.lng,
        );
    }
    Ok(())
}

fn handle_show(store_path: &Path, node: &str) -> Result<()> {
    let store = open_store(store_path)?;
    let point = store.point(node)?;
    println!("Node:     {}", point.node);
    println!("Name:     {}", point.name);
    println!("Category: {}", point.category);
    println!("Fill:     {}%", point.fill);
    println!("Status:   {}", point.status);
    println!(
        "Location: ({:.5}, {:.5})",
        point.coordinates.lat, point.coordinates.lng
    );
    println!(
        "Emptied:  {}",
        point.last_emptied_at.as_deref().unwrap_or("never")
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_update(
    store_path: &Path,
    node: &str,
    name: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    category: Option<String>,
    fill: Option<u8>,
    status: Option<String>,
    emptied_now: bool,
) -> Result<()> {
    let store = open_store(store_path)?;
    let current = store.point(node)?;

    let coordinates = match (lat, lng) {
        (None, None) => None,
        (lat, lng) => Some(Coordinates {
            lat: lat.unwrap_or(current.coordinates.lat),
            lng: lng.unwrap_or(current.coordinates.lng),
        }),
    };
    let category = category
        .as_deref()
        .map(Category::from_str)
        .transpose()?;
    let status = status
        .as_deref()
        .map(PointStatus::from_str)
        .transpose()?;

    let updated = store.update_point(
        node,
        PointUpdate {
            name,
            coordinates,
            category,
            fill,
            status,
            last_emptied_at: emptied_now.then(|| chrono::Utc::now().to_rfc3339()),
        },
    )?;
    println!("Updated {} ({})", updated.node, updated.name);
    Ok(())
}

fn handle_remove(store_path: &Path, node: &str) -> Result<()> {
    let store = open_store(store_path)?;
    store.delete_point(node)?;
    println!("Removed {node} and its edges and reports");
    Ok(())
}

fn handle_edges(store_path: &Path) -> Result<()> {
    let store = open_store(store_path)?;
    let edges = store.edges().context("failed to list edges")?;
    if edges.is_empty() {
        println!("No edges in the store.");
        return Ok(());
    }
    for edge in edges {
        println!(
            "{} -> {}: {:.0} m (refreshed {})",
            edge.from, edge.to, edge.distance_m, edge.last_fetched_at
        );
    }
    Ok(())
}

fn handle_report(store_path: &Path, node: &str, message: &str) -> Result<()> {
    let store = open_store(store_path)?;
    let report = store.add_report(node, message)?;
    println!("Filed report #{} against {}", report.id, report.node);
    Ok(())
}

fn handle_reports(store_path: &Path, node: &str) -> Result<()> {
    let store = open_store(store_path)?;
    let reports = store.reports_for(node)?;
    if reports.is_empty() {
        println!("No reports for {node}.");
        return Ok(());
    }
    for report in reports {
        println!(
            "#{} [{}] {} ({})",
            report.id, report.status, report.message, report.created_at
        );
    }
    Ok(())
}

fn handle_plan(store_path: &Path, threshold: u8, json: bool) -> Result<()> {
    let store = open_store(store_path)?;
    let network = store.snapshot().context("failed to snapshot the store")?;
    let provider = OrsClient::from_env().context("failed to build the provider client")?;
    let policy = CollectionPolicy {
        fill_threshold: threshold,
    };

    let plan = plan_collection(&network, &provider, &policy)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Depot: {} ({})", plan.depot.node, plan.depot.name);
    if plan.is_empty() {
        println!("No bins require collection.");
        return Ok(());
    }
    println!("Stops:");
    for (index, stop) in plan.stops.iter().enumerate() {
        println!(
            "{:3}. {} ({}) fill {}%",
            index + 1,
            stop.node,
            stop.name,
            stop.fill
        );
    }
    println!("Total distance: {}", plan.formatted_distance());
    println!("Geometry points: {}", plan.polyline.len());
    Ok(())
}

fn open_store(path: &Path) -> Result<GraphStore> {
    GraphStore::open(path)
        .with_context(|| format!("failed to open the store at {}", path.display()))
}

fn resolve_store_path(overridden: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = overridden {
        return Ok(path);
    }
    let dirs = directories::ProjectDirs::from("dev", "curbside", "curbside")
        .ok_or_else(|| anyhow!("failed to resolve a data directory for the store"))?;
    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    Ok(data_dir.join("curbside.db"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so command output (including --json) stays clean.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
