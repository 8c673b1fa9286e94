pub mod cli;
pub mod config;
pub mod domain;
pub mod effects;
pub mod host;
pub mod sim;

use std::sync::Arc;

use anyhow::{Context, Result};
use cli::Cli;
use config::SimConfig;
use domain::actor::ActorId;
use host::memory::MemoryHost;
use rand::{SeedableRng, rngs::StdRng};
use sim::{
    events::{SimEvent, forward_ctrl_c, schedule_shutdown, spawn_point, start_wander_task},
    state::Simulation,
};
use tokio::sync::mpsc;

/// Runs the weather cycle against an in-memory host populated with synthetic actors.
pub async fn run(cli: Cli) -> Result<()> {
    let config = SimConfig::load(&cli).context("loading simulation config failed")?;
    let host = Arc::new(MemoryHost::new());
    let actors = populate(&host, cli.actors, config.seed);
    tracing::info!(actors = actors.len(), seed = ?config.seed, "starting weather director");

    let (tx, mut rx) = mpsc::channel::<SimEvent>(256);
    let mut simulation = Simulation::new(Arc::clone(&host), config.clone(), tx.clone())
        .context("simulation config rejected")?;

    let wander = start_wander_task(Arc::clone(&host), tx.clone(), actors, cli.churn, config.seed);
    if let Some(secs) = cli.run_for {
        schedule_shutdown(tx.clone(), secs);
    }
    forward_ctrl_c(tx);

    simulation.run(&mut rx).await;
    wander.abort();

    tracing::info!(
        visuals = host.visuals_created(),
        sounds = host.sounds_created(),
        "all effects released"
    );
    Ok(())
}

fn populate(host: &MemoryHost, count: u16, seed: Option<u64>) -> Vec<ActorId> {
    let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    (0..u64::from(count))
        .map(|id| {
            let actor = ActorId(id);
            host.connect(actor, Some(spawn_point(&mut rng)));
            actor
        })
        .collect()
}

pub fn init_tracing(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();
}
