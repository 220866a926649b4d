use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use nav_cli::load_colliders;
use nav_core::{
    global_to_local, plan, GeodeticPosition, PlanConfig, PlanMode, PlannedPath, PruneMode,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Plan a route over a colliders map and print it as JSON",
    long_about = None
)]
struct Args {
    #[arg(long, default_value = "colliders.csv")]
    colliders: PathBuf,

    /// Start longitude; defaults to the map home
    #[arg(long, allow_hyphen_values = true)]
    start_lon: Option<f64>,

    /// Start latitude; defaults to the map home
    #[arg(long, allow_hyphen_values = true)]
    start_lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    goal_lon: f64,

    #[arg(long, allow_hyphen_values = true)]
    goal_lat: f64,

    #[arg(long, default_value_t = 5.0)]
    target_altitude: f64,

    #[arg(long, default_value_t = 5.0)]
    safety_distance: f64,

    #[arg(long, default_value = "grid")]
    plan_mode: PlanMode,

    #[arg(long, default_value = "line_of_sight")]
    prune_mode: PruneMode,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct RouteReport {
    generated_at: DateTime<Utc>,
    home: GeodeticPosition,
    start: GeodeticPosition,
    goal: GeodeticPosition,
    config: PlanConfig,
    #[serde(flatten)]
    plan: PlannedPath,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("nav_core=debug".parse()?))
        .init();

    let args = Args::parse();
    let map = load_colliders(&args.colliders)?;
    let home = GeodeticPosition::new(map.home().lon, map.home().lat, 0.0);

    let start = GeodeticPosition::new(
        args.start_lon.unwrap_or(home.lon),
        args.start_lat.unwrap_or(home.lat),
        0.0,
    );
    let goal = GeodeticPosition::new(args.goal_lon, args.goal_lat, 0.0);

    let config = PlanConfig {
        target_altitude: args.target_altitude,
        safety_distance: args.safety_distance,
        mode: args.plan_mode,
        prune: args.prune_mode,
    };
    let planned = plan(
        map.obstacles(),
        global_to_local(start, home),
        global_to_local(goal, home),
        &config,
    )
    .context("planning failed")?;

    let report = RouteReport {
        generated_at: Utc::now(),
        home,
        start,
        goal,
        config,
        plan: planned,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
