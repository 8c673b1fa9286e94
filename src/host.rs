//! Collaborator interfaces the simulation drives.
//!
//! The host owns actors, scene primitives and audio playback. The simulation
//! only ever holds opaque handles and never assumes a handle stays valid after
//! it asked the host to destroy it.

pub mod memory;

use glam::{Quat, Vec3};
use thiserror::Error;

use crate::domain::{
    actor::{ActorId, Point3},
    weather::WeatherKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    RainEmitter,
    BoltSegment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundTemplate {
    RainLoop,
    ThunderCrack,
    ThunderRumble,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Point3,
    pub rotation: Quat,
    pub size: Vec3,
}

impl Transform {
    #[must_use]
    pub fn at(position: Point3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            size: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub transparency: f32,
    pub glow: bool,
}

impl Material {
    #[must_use]
    pub fn bolt(transparency: f32) -> Self {
        Self {
            color: [0.78, 0.86, 1.0],
            transparency,
            glow: true,
        }
    }

    #[must_use]
    pub fn rain() -> Self {
        Self {
            color: [0.62, 0.7, 0.82],
            transparency: 0.4,
            glow: false,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("asset missing: {0}")]
    MissingAsset(String),
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

pub trait ActorRoster {
    fn connected(&self) -> Vec<ActorId>;
}

pub trait PositionProvider {
    /// `None` while the actor has no live body in the scene.
    fn position(&self, actor: ActorId) -> Option<Point3>;
}

pub trait ScenePrimitives {
    fn create_visual(
        &self,
        kind: VisualKind,
        transform: Transform,
        material: Material,
    ) -> Result<VisualHandle, HostError>;
    fn destroy_visual(&self, handle: VisualHandle);
    fn set_transparency(&self, handle: VisualHandle, transparency: f32);
    fn move_visual(&self, handle: VisualHandle, position: Point3);
    fn set_emitting(&self, handle: VisualHandle, emitting: bool);
}

pub trait AudioFactory {
    fn create_sound(
        &self,
        template: SoundTemplate,
        position: Point3,
        max_distance: f32,
    ) -> Result<SoundHandle, HostError>;
    fn play(&self, handle: SoundHandle);
    fn stop(&self, handle: SoundHandle);
    fn destroy_sound(&self, handle: SoundHandle);
    fn set_volume(&self, handle: SoundHandle, volume: f32);
    fn set_looped(&self, handle: SoundHandle, looped: bool);
}

pub trait BackdropSwapper {
    fn set_backdrop(&self, weather: WeatherKind) -> Result<(), HostError>;
}

/// Everything the simulation needs from its embedding application.
pub trait Host: ActorRoster + PositionProvider + ScenePrimitives + AudioFactory + BackdropSwapper {}

impl<T> Host for T where
    T: ActorRoster + PositionProvider + ScenePrimitives + AudioFactory + BackdropSwapper + ?Sized
{
}

/// Live positions of every connected actor; actors without a body are skipped.
pub fn listener_positions<H>(host: &H) -> Vec<Point3>
where
    H: ActorRoster + PositionProvider + ?Sized,
{
    host.connected()
        .into_iter()
        .filter_map(|actor| host.position(actor))
        .collect()
}

/// Logs a failed host call the way the simulation treats it: missing assets
/// are expected and quiet, anything else is worth a warning.
pub(crate) fn note_host_error(step: &str, err: &HostError) {
    match err {
        HostError::MissingAsset(_) => tracing::debug!(step, %err, "skipping step"),
        HostError::Unavailable(_) => tracing::warn!(step, %err, "host call failed"),
    }
}
