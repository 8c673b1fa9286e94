#![allow(dead_code)]

use std::sync::Arc;

use glam::Vec3;
use tokio::sync::mpsc;
use weather_director::{
    config::SimConfig,
    domain::actor::ActorId,
    host::memory::MemoryHost,
    sim::{events::SimEvent, state::Simulation},
};

pub struct Fixture {
    pub host: Arc<MemoryHost>,
    pub simulation: Simulation<MemoryHost>,
    pub tx: mpsc::Sender<SimEvent>,
    pub rx: mpsc::Receiver<SimEvent>,
}

pub fn seeded(seed: u64) -> SimConfig {
    SimConfig {
        seed: Some(seed),
        ..SimConfig::default()
    }
}

/// Actors spaced far enough apart that their strike zones never overlap.
pub fn spread_actors(count: u64) -> Vec<(ActorId, Vec3)> {
    (0..count)
        .map(|id| (ActorId(id), Vec3::new(id as f32 * 500.0, 0.0, 0.0)))
        .collect()
}

pub fn fixture(actors: &[(ActorId, Vec3)], config: SimConfig) -> Fixture {
    let host = Arc::new(MemoryHost::new());
    for (actor, position) in actors {
        host.connect(*actor, Some(*position));
    }
    let (tx, rx) = mpsc::channel(128);
    let simulation = Simulation::new(Arc::clone(&host), config, tx.clone())
        .expect("fixture config is valid");
    Fixture {
        host,
        simulation,
        tx,
        rx,
    }
}

pub async fn next_round(rx: &mut mpsc::Receiver<SimEvent>) -> SimEvent {
    loop {
        match rx.recv().await {
            Some(event @ SimEvent::ThunderRound { .. }) => return event,
            Some(_) => {}
            None => panic!("event channel closed"),
        }
    }
}
