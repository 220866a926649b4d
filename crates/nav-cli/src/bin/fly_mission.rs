use anyhow::{Context, Result};
use clap::Parser;
use nav_cli::sim::{SimConfig, Simulator};
use nav_cli::{load_colliders, HttpWaypointSink};
use nav_core::{NedPosition, PlanMode, PruneMode};
use nav_mission::{run_event_loop, LoopExit, MissionConfig, MissionController};
use std::path::PathBuf;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fly a planned mission against the simulated vehicle",
    long_about = None
)]
struct Args {
    /// Colliders CSV with the home header line
    #[arg(long, default_value = "colliders.csv")]
    colliders: PathBuf,

    /// Goal longitude (overrides NAV_GOAL_LON)
    #[arg(long, allow_hyphen_values = true)]
    goal_lon: Option<f64>,

    /// Goal latitude (overrides NAV_GOAL_LAT)
    #[arg(long, allow_hyphen_values = true)]
    goal_lat: Option<f64>,

    #[arg(long)]
    target_altitude: Option<f64>,

    #[arg(long)]
    safety_distance: Option<f64>,

    /// grid | skeleton
    #[arg(long)]
    plan_mode: Option<PlanMode>,

    /// collinearity | line_of_sight | none
    #[arg(long)]
    prune_mode: Option<PruneMode>,

    /// Simulated start, meters north of home
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    start_north: f64,

    /// Simulated start, meters east of home
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    start_east: f64,

    /// Simulator cruise speed in m/s
    #[arg(long, default_value_t = 5.0)]
    speed: f64,

    /// POST the planned route to this URL
    #[arg(long)]
    viewer_url: Option<String>,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 900)]
    timeout: u64,
}

impl Args {
    fn mission_config(&self) -> MissionConfig {
        let mut config = MissionConfig::from_env();
        if let Some(lon) = self.goal_lon {
            config.goal.lon = lon;
        }
        if let Some(lat) = self.goal_lat {
            config.goal.lat = lat;
        }
        if let Some(altitude) = self.target_altitude {
            config.target_altitude = altitude;
        }
        if let Some(distance) = self.safety_distance {
            config.safety_distance = distance;
        }
        if let Some(mode) = self.plan_mode {
            config.plan_mode = mode;
        }
        if let Some(mode) = self.prune_mode {
            config.prune_mode = mode;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("nav_mission=info".parse()?)
            .add_directive("nav_cli=info".parse()?))
        .init();

    let args = Args::parse();
    let config = args.mission_config();
    let map = load_colliders(&args.colliders)?;
    tracing::info!(
        obstacles = map.obstacles().len(),
        goal_lon = config.goal.lon,
        goal_lat = config.goal.lat,
        "Loaded obstacle map"
    );

    let (simulator, link) = Simulator::new(SimConfig {
        origin: map.home(),
        start: NedPosition::new(args.start_north, args.start_east, 0.0),
        max_speed: args.speed,
        ..SimConfig::default()
    });

    let mut controller =
        MissionController::new(config, map, link).context("mission rejected before takeoff")?;
    if let Some(url) = &args.viewer_url {
        controller = controller.with_sink(HttpWaypointSink::new(url.clone())?);
    }

    let (event_tx, event_rx) = mpsc::channel(64);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let sim_task = tokio::spawn(simulator.clone().run(event_tx, shutdown_tx.subscribe()));

    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            let _ = ctrl_c_tx.send(());
        }
    });

    let exit = tokio::time::timeout(
        Duration::from_secs(args.timeout),
        run_event_loop(&mut controller, event_rx, shutdown_tx.subscribe()),
    )
    .await;

    let _ = shutdown_tx.send(());
    sim_task.await.context("simulator task failed")?;

    let final_state = simulator.snapshot();
    match exit {
        Ok(LoopExit::MissionComplete) => {
            tracing::info!(
                north = final_state.position.north,
                east = final_state.position.east,
                "Mission complete"
            );
        }
        Ok(other) => {
            tracing::warn!(exit = ?other, state = ?controller.state(), "Mission interrupted");
        }
        Err(_) => anyhow::bail!(
            "mission did not finish within {}s (stuck in {:?})",
            args.timeout,
            controller.state()
        ),
    }

    if let Some(reason) = controller.abort_reason() {
        anyhow::bail!("goal unreachable: {reason}");
    }
    Ok(())
}
