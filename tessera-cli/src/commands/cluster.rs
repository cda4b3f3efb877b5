//! Cluster command - group points from a CSV file by zoom level.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tessera::cluster::{ClusterConfig, ClusterGroup};
use tessera::coord::Point;
use tracing::{debug, info};

use super::common::{load_config, print_json};
use crate::error::CliError;
use crate::GlobalArgs;

/// Arguments for the cluster command.
pub struct ClusterArgs {
    pub input: PathBuf,
    pub level: Option<u8>,
    pub radius: Option<f64>,
    pub max_level: Option<u8>,
}

#[derive(Debug, Serialize)]
struct ClusterRow {
    center: Point,
    count: usize,
}

#[derive(Debug, Serialize)]
struct LevelView {
    level: u8,
    threshold: f64,
    clusters: Vec<ClusterRow>,
    points: Vec<Point>,
}

#[derive(Debug, Serialize)]
struct LevelCounts {
    level: u8,
    threshold: f64,
    clusters: usize,
    points: usize,
}

/// Run the cluster command.
///
/// With `--level`, prints the clusters and lone points visible at that
/// level; otherwise prints a per-level summary.
pub fn run(args: ClusterArgs, global: &GlobalArgs) -> Result<(), CliError> {
    let config = load_config(global.config.as_deref())?;
    let cluster_config = resolve_cluster_config(&config.cluster, args.max_level, args.radius)?;

    let points = read_points(&args.input)?;
    let mut group = ClusterGroup::new(cluster_config);
    group.extend(points)?;
    info!(
        points = group.count(),
        file = %args.input.display(),
        "Points clustered"
    );

    match args.level {
        Some(level) => print_level(&group, level, global.json),
        None => print_summary(&group, global.json),
    }
}

/// Apply command-line overrides on top of the configured clustering.
fn resolve_cluster_config(
    base: &ClusterConfig,
    max_level: Option<u8>,
    radius: Option<f64>,
) -> Result<ClusterConfig, CliError> {
    if max_level.is_none() && radius.is_none() {
        return Ok(base.clone());
    }
    let halving = ClusterConfig::new(base.max_level(), base.radius())?;
    if halving != *base {
        return Err(CliError::InvalidArgument(
            "--max-level and --radius cannot adjust an explicit thresholds table; \
             edit [cluster] thresholds in the config file instead"
                .to_string(),
        ));
    }
    let config = ClusterConfig::new(
        max_level.unwrap_or(base.max_level()),
        radius.unwrap_or(base.radius()),
    )?;
    Ok(config)
}

fn print_level(group: &ClusterGroup, level: u8, json: bool) -> Result<(), CliError> {
    let view = LevelView {
        level,
        threshold: group.threshold(level),
        clusters: group
            .clusters(level)
            .into_iter()
            .map(|node| ClusterRow {
                center: node.center(),
                count: node.count(),
            })
            .collect(),
        points: group.points(level),
    };

    if json {
        return print_json(&view);
    }

    println!(
        "Level {} (threshold {}): {} clusters, {} points",
        view.level,
        view.threshold,
        view.clusters.len(),
        view.points.len()
    );
    for cluster in &view.clusters {
        println!("  cluster {:>6}  {}", cluster.count, cluster.center);
    }
    for point in &view.points {
        println!("  point          {}", point);
    }
    Ok(())
}

fn print_summary(group: &ClusterGroup, json: bool) -> Result<(), CliError> {
    let levels: Vec<LevelCounts> = (0..=group.config().max_level())
        .map(|level| LevelCounts {
            level,
            threshold: group.threshold(level),
            clusters: group.clusters(level).len(),
            points: group.points(level).len(),
        })
        .collect();

    if json {
        return print_json(&levels);
    }

    println!("{} points", group.count());
    println!("{:>5}  {:>12}  {:>8}  {:>8}", "level", "threshold", "clusters", "points");
    for row in &levels {
        println!(
            "{:>5}  {:>12.6}  {:>8}  {:>8}",
            row.level, row.threshold, row.clusters, row.points
        );
    }
    Ok(())
}

/// Read `x,y` pairs, one per line.
///
/// Blank lines and lines starting with `#` are skipped, as is a first line
/// that does not parse (a header). Extra columns are ignored.
fn read_points(path: &Path) -> Result<Vec<Point>, CliError> {
    let text = fs::read_to_string(path).map_err(|error| CliError::Input {
        path: path.to_path_buf(),
        error,
    })?;
    parse_points(&text).map_err(|(line, reason)| CliError::InvalidInput {
        path: path.to_path_buf(),
        line,
        reason,
    })
}

fn parse_points(text: &str) -> Result<Vec<Point>, (usize, String)> {
    let mut points = Vec::new();
    let mut first = true;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let is_header = std::mem::replace(&mut first, false);

        match parse_pair(line) {
            Some(point) => points.push(point),
            None if is_header => debug!(header = line, "Skipping header line"),
            None => {
                return Err((
                    number + 1,
                    format!("expected two finite numbers, got '{}'", line),
                ))
            }
        }
    }
    Ok(points)
}

fn parse_pair(line: &str) -> Option<Point> {
    let mut fields = line.split(',').map(|f| f.trim().trim_matches('"'));
    let x: f64 = fields.next()?.parse().ok()?;
    let y: f64 = fields.next()?.parse().ok()?;
    let point = Point::new(x, y);
    point.is_finite().then_some(point)
}
