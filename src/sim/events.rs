use std::{sync::Arc, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};

use crate::{config::IntRange, domain::actor::ActorId, host::memory::MemoryHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    ActorConnected(ActorId),
    ActorDisconnected(ActorId),
    ThunderRound { cycle: u64 },
    Shutdown,
}

/// Emits a round right away, then one after every random whole-second pause.
///
/// Pauses come from a task-local generator seeded by the caller, so a seeded
/// simulation paces its rounds identically on every run.
pub fn start_thunder_task(
    tx: mpsc::Sender<SimEvent>,
    cycle: u64,
    interval_secs: IntRange,
    pacing_seed: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(pacing_seed);
        loop {
            if tx.send(SimEvent::ThunderRound { cycle }).await.is_err() {
                break;
            }
            let wait_secs = rng.random_range(interval_secs.min..=interval_secs.max);
            sleep(Duration::from_secs(u64::from(wait_secs))).await;
        }
    })
}

/// Moves the synthetic actors of the headless host once per second and, with
/// `churn`, occasionally drops or brings back one of them.
pub fn start_wander_task(
    host: Arc<MemoryHost>,
    tx: mpsc::Sender<SimEvent>,
    actors: Vec<ActorId>,
    churn: bool,
    seed: Option<u64>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let mut offline: Vec<ActorId> = Vec::new();
        loop {
            sleep(Duration::from_secs(1)).await;
            host.wander(&mut rng, 1.5);
            if !churn || !rng.random_bool(0.05) {
                continue;
            }

            let event = if !offline.is_empty() && rng.random_bool(0.5) {
                let actor = offline.swap_remove(rng.random_range(0..offline.len()));
                host.connect(actor, Some(spawn_point(&mut rng)));
                SimEvent::ActorConnected(actor)
            } else {
                let online = actors
                    .iter()
                    .copied()
                    .filter(|actor| !offline.contains(actor))
                    .collect::<Vec<_>>();
                if online.is_empty() {
                    continue;
                }
                let actor = online[rng.random_range(0..online.len())];
                host.disconnect(actor);
                offline.push(actor);
                SimEvent::ActorDisconnected(actor)
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    })
}

pub fn schedule_shutdown(tx: mpsc::Sender<SimEvent>, delay_secs: u64) {
    tokio::spawn(async move {
        sleep(Duration::from_secs(delay_secs)).await;
        let _ = tx.send(SimEvent::Shutdown).await;
    });
}

pub fn forward_ctrl_c(tx: mpsc::Sender<SimEvent>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(SimEvent::Shutdown).await;
        }
    });
}

/// Scatter point for a (re)spawning synthetic actor.
pub fn spawn_point<R: Rng + ?Sized>(rng: &mut R) -> glam::Vec3 {
    glam::Vec3::new(
        rng.random_range(-120.0..120.0),
        0.0,
        rng.random_range(-120.0..120.0),
    )
}
