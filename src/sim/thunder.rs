use std::f32::consts::TAU;

use glam::Vec3;
use rand::{Rng, seq::IndexedRandom};
use tokio::{sync::mpsc, task::JoinHandle};

use super::events::{SimEvent, start_thunder_task};
use crate::{
    config::{IntRange, ThunderConfig},
    domain::actor::{ActorId, Point3},
};

/// Handle on the background task that paces thunder rounds.
///
/// Each start stamps its rounds with a fresh generation; rounds from a
/// cancelled generation still sitting in the channel are rejected by
/// [`ThunderCycle::accepts`].
#[derive(Debug, Default)]
pub struct ThunderCycle {
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl ThunderCycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns the pacing task. Returns `false` when a cycle is already running.
    pub fn start(
        &mut self,
        tx: &mpsc::Sender<SimEvent>,
        interval_secs: IntRange,
        pacing_seed: u64,
    ) -> bool {
        if self.is_running() {
            return false;
        }
        self.generation += 1;
        self.task = Some(start_thunder_task(
            tx.clone(),
            self.generation,
            interval_secs,
            pacing_seed,
        ));
        tracing::debug!(generation = self.generation, "thunder cycle started");
        true
    }

    /// Stops the pacing task and invalidates any round it already queued.
    pub fn cancel(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };
        task.abort();
        self.generation += 1;
        tracing::debug!("thunder cycle cancelled");
        true
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    #[must_use]
    pub fn accepts(&self, cycle: u64) -> bool {
        self.task.is_some() && cycle == self.generation
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for ThunderCycle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Picks the distinct actors that receive a strike this round.
pub fn plan_round<R: Rng + ?Sized>(
    roster: &[ActorId],
    config: &ThunderConfig,
    rng: &mut R,
) -> Vec<ActorId> {
    if roster.is_empty() {
        return Vec::new();
    }
    let IntRange { min, max } = config.strikes_per_round;
    let wanted = rng.random_range(min..=max) as usize;
    roster
        .choose_multiple(rng, wanted.min(roster.len()))
        .copied()
        .collect()
}

/// Random point in a disc around `anchor`, lifted into the cloud band above it.
pub fn strike_origin<R: Rng + ?Sized>(
    anchor: Point3,
    config: &ThunderConfig,
    rng: &mut R,
) -> Point3 {
    let angle = rng.random_range(0.0..TAU);
    let radius = if config.spawn_radius > 0.0 {
        rng.random_range(0.0..=config.spawn_radius)
    } else {
        0.0
    };
    let height = rng.random_range(config.spawn_height.min..=config.spawn_height.max);
    anchor + Vec3::new(angle.cos() * radius, height, angle.sin() * radius)
}
